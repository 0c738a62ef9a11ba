//! src/email/brevo/email.rs
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    email: String,
}

impl Contact {
    pub fn named(name: &str, email: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            email: email.to_owned(),
        }
    }

    pub fn address(email: &str) -> Self {
        Self {
            name: None,
            email: email.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Email<'a> {
    sender: &'a Contact,
    pub to: Vec<&'a Contact>,
    pub subject: &'a str,
    #[serde(rename = "htmlContent")]
    pub html_content: &'a str,
}

pub struct EmailBuilder<'a> {
    sender: &'a Contact,
    to: Vec<&'a Contact>,
    subject: &'a str,
    html_content: &'a str,
}

impl<'a> EmailBuilder<'a> {
    pub fn new(sender: &'a Contact) -> Self {
        Self {
            sender,
            to: vec![],
            subject: "",
            html_content: "",
        }
    }

    pub fn to(mut self, contact: &'a Contact) -> Self {
        self.to.push(contact);
        self
    }

    pub fn subject(mut self, subject: &'a str) -> Self {
        self.subject = subject;
        self
    }

    pub fn html_content(mut self, html_content: &'a str) -> Self {
        self.html_content = html_content;
        self
    }

    pub fn build(self) -> Email<'a> {
        Email {
            sender: self.sender,
            to: self.to,
            subject: self.subject,
            html_content: self.html_content,
        }
    }
}

#[derive(Debug)]
pub struct HttpClient {
    pub client: Client,
    pub url: String,
    pub api_key: Secret<String>,
}

impl HttpClient {
    pub async fn send_email(&self, email: &Email<'_>) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(&self.url)
            .header("api-key", self.api_key.expose_secret())
            .header("accept", "application/json")
            .json(email)
            .send()
            .await?
            .error_for_status()
    }
}
