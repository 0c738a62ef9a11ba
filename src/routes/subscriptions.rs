//! src/routes/subscriptions.rs
use crate::domain::{Newsletter, NewsletterId, NewsletterStore, SubscriberEmail, SubscriberStore};
use crate::routes::error_chain_fmt;
use crate::subscription_manager::{SubscriptionManager, SOURCE};
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

const INVALID_EMAIL: &str = "Invalid or missing E-Mail.";
const MISSING_NEWSLETTER: &str = "You must provide the newsletter id to subscribe to.";

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum NewsletterKey {
    Text(String),
    Number(u64),
}

impl NewsletterKey {
    fn into_id(self) -> Option<NewsletterId> {
        match self {
            NewsletterKey::Text(s) if s.trim().is_empty() => None,
            NewsletterKey::Text(s) => Some(NewsletterId::new(s.trim())),
            NewsletterKey::Number(n) => Some(NewsletterId::new(n.to_string())),
        }
    }
}

/// `newsletterId` may be a single id or a list of them.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum NewsletterIds {
    One(NewsletterKey),
    Many(Vec<NewsletterKey>),
}

impl NewsletterIds {
    /// Duplicates are dropped; `None` when the list is empty or holds an
    /// empty id.
    fn into_ids(self) -> Option<Vec<NewsletterId>> {
        let keys = match self {
            NewsletterIds::One(key) => vec![key],
            NewsletterIds::Many(keys) => keys,
        };

        let mut ids: Vec<NewsletterId> = Vec::with_capacity(keys.len());
        for key in keys {
            let id = key.into_id()?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }
}

/// Fields of the wrong JSON type read as absent so they surface as
/// validation errors instead of payload errors.
#[derive(Deserialize, Debug)]
pub struct SubscribeRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, rename = "newsletterId", deserialize_with = "lenient")]
    pub newsletter_id: Option<NewsletterIds>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Serialize)]
struct SubscribeResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    message: &'a str,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::ValidationError(message) => message.as_str(),
            SubscribeError::UnexpectedError(_) => "Failed to register the subscription.",
        };
        HttpResponse::build(self.status_code()).json(ErrorMessage { message })
    }
}

/// Bodies that are not JSON never reach `subscribe`; answer them in the
/// same `{message}` shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid request body: {}", err);
    let response = HttpResponse::BadRequest().json(ErrorMessage { message: &message });
    InternalError::from_response(err, response).into()
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(payload, subscribers, newsletters, manager),
    fields(
        request_id = %Uuid::new_v4(),
        subscriber_email = ?payload.email,
    )
)]
pub async fn subscribe(
    payload: web::Json<SubscribeRequest>,
    subscribers: web::Data<dyn SubscriberStore>,
    newsletters: web::Data<dyn NewsletterStore>,
    manager: web::Data<SubscriptionManager>,
) -> Result<HttpResponse, SubscribeError> {
    let request = payload.into_inner();

    let email = request
        .email
        .and_then(|email| SubscriberEmail::parse(email).ok())
        .ok_or_else(|| SubscribeError::ValidationError(INVALID_EMAIL.into()))?;

    let newsletter_ids = request
        .newsletter_id
        .and_then(NewsletterIds::into_ids)
        .ok_or_else(|| SubscribeError::ValidationError(MISSING_NEWSLETTER.into()))?;

    let targets = load_newsletters(newsletters.get_ref(), newsletter_ids).await?;

    let mut subscriber = match subscribers
        .find_by_email(&email)
        .await
        .context("Failed to look up subscriber by email")?
    {
        Some(subscriber) => subscriber,
        None => subscribers
            .create(&email)
            .await
            .context("Failed to create a new subscriber")?,
    };

    for newsletter in &targets {
        manager
            .subscribe(&mut subscriber, newsletter, true, SOURCE)
            .await?;
    }

    manager.send_confirmations(&subscriber).await?;

    let names: Vec<&str> = targets.iter().map(|n| n.name.as_str()).collect();
    Ok(HttpResponse::Ok().json(SubscribeResponse {
        response: format!(
            "{} was subscribed to the newsletter(s) {}",
            email,
            names.join(", ")
        ),
    }))
}

#[tracing::instrument(name = "Loading requested newsletters", skip(newsletters))]
async fn load_newsletters(
    newsletters: &dyn NewsletterStore,
    ids: Vec<NewsletterId>,
) -> Result<Vec<Newsletter>, SubscribeError> {
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        let newsletter = newsletters
            .find(&id)
            .await
            .with_context(|| format!("Failed to load newsletter {}", id))?
            .ok_or_else(|| SubscribeError::ValidationError(format!("Unknown newsletter id: {}", id)))?;
        found.push(newsletter);
    }
    Ok(found)
}
