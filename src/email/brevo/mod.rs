//! src/email/brevo/mod.rs
use crate::configuration::EmailSettings;
use crate::domain::SubscriberEmail;
use crate::email::EmailClient;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

mod email;
use email::{Contact, EmailBuilder, HttpClient};

#[derive(Debug)]
pub struct Brevo {
    sender: Contact,
    http_client: HttpClient,
}

impl Brevo {
    pub fn new(settings: &EmailSettings) -> Result<Self, anyhow::Error> {
        let sender = SubscriberEmail::parse(settings.sender_email.clone())
            .context("Invalid sender email address")?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to build the http client")?;

        let http_client = HttpClient {
            client,
            url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
        };

        Ok(Self {
            sender: Contact::named(&settings.sender_name, sender.as_ref()),
            http_client,
        })
    }

    fn email_builder(&self) -> EmailBuilder {
        EmailBuilder::new(&self.sender)
    }
}

#[async_trait]
impl EmailClient for Brevo {
    #[tracing::instrument(name = "Sending an email through Brevo", skip(self, html_content))]
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error> {
        let to = Contact::address(recipient.as_ref());
        let email = self
            .email_builder()
            .to(&to)
            .subject(subject)
            .html_content(html_content)
            .build();

        self.http_client
            .send_email(&email)
            .await
            .with_context(|| format!("Failed to send email to {}", recipient))?;

        Ok(())
    }
}
