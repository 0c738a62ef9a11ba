//! src/routes/subscriptions_confirm.rs
use crate::domain::{NewsletterId, NewsletterStore, SubscriberId, SubscriberStore};
use crate::link_signer::LinkSigner;
use crate::messages::Messages;
use crate::routes::error_chain_fmt;
use crate::subscription_manager::{SubscriptionManager, SOURCE};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct ConfirmationResponse {
    pub success: bool,
    pub message: String,
}

/// Every variant carries the localized text shown to the subscriber.
#[derive(thiserror::Error)]
pub enum ConfirmationError {
    #[error("{0}")]
    InvalidLink(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Expired(String),
    #[error("{0}")]
    UnexpectedError(String, #[source] anyhow::Error),
}

impl std::fmt::Debug for ConfirmationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConfirmationError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmationError::InvalidLink(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ConfirmationError::NotFound(_) => StatusCode::NOT_FOUND,
            ConfirmationError::Expired(_) => StatusCode::FORBIDDEN,
            ConfirmationError::UnexpectedError(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ConfirmationResponse {
            success: false,
            message: self.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Add,
    Remove,
}

impl ConfirmAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" | "subscribe" => Some(ConfirmAction::Add),
            "remove" | "unsubscribe" => Some(ConfirmAction::Remove),
            _ => None,
        }
    }
}

/// Segments stay strings so that malformed links get the same answer as
/// forged ones.
#[derive(Deserialize, Debug)]
pub struct Parameters {
    action: String,
    snid: String,
    newsletter_id: String,
    timestamp: String,
    hash: String,
}

#[tracing::instrument(
    name = "Confirm a single subscription change",
    skip(parameters, subscribers, newsletters, manager, signer, messages),
    fields(
        action = %parameters.action,
        subscriber_id = %parameters.snid,
        newsletter_id = %parameters.newsletter_id,
    )
)]
pub async fn confirm(
    parameters: web::Path<Parameters>,
    subscribers: web::Data<dyn SubscriberStore>,
    newsletters: web::Data<dyn NewsletterStore>,
    manager: web::Data<SubscriptionManager>,
    signer: web::Data<LinkSigner>,
    messages: web::Data<Messages>,
) -> Result<HttpResponse, ConfirmationError> {
    let invalid = || ConfirmationError::InvalidLink(messages.generic_failure().into());
    let unexpected =
        |e: anyhow::Error| ConfirmationError::UnexpectedError(messages.generic_failure().into(), e);

    let parameters = parameters.into_inner();
    let (Ok(snid), Ok(timestamp)) = (
        parameters.snid.parse::<SubscriberId>(),
        parameters.timestamp.parse::<i64>(),
    ) else {
        return Err(invalid());
    };

    let mut subscriber = subscribers
        .find_by_id(snid)
        .await
        .map_err(unexpected)?
        .ok_or_else(invalid)?;

    if !signer.verify(
        &subscriber.email,
        &parameters.action,
        timestamp,
        &parameters.hash,
    ) {
        tracing::warn!("Rejected a confirmation link with a mismatching hash");
        return Err(invalid());
    }

    let action = ConfirmAction::parse(&parameters.action).ok_or_else(invalid)?;

    // Removal links stay usable after they expire.
    if action != ConfirmAction::Remove && signer.is_expired(timestamp) {
        return Err(ConfirmationError::Expired(messages.link_expired().into()));
    }

    let newsletter = newsletters
        .find(&NewsletterId::new(parameters.newsletter_id))
        .await
        .map_err(unexpected)?
        .ok_or_else(invalid)?;

    let message = match action {
        ConfirmAction::Remove => {
            manager
                .unsubscribe(&mut subscriber, &newsletter, false, SOURCE)
                .await
                .map_err(unexpected)?;
            messages.unsubscribed(&newsletter.name)
        }
        ConfirmAction::Add => {
            manager
                .subscribe(&mut subscriber, &newsletter, false, SOURCE)
                .await
                .map_err(unexpected)?;
            messages.subscribed(&newsletter.name)
        }
    };

    Ok(HttpResponse::Ok().json(ConfirmationResponse {
        success: true,
        message,
    }))
}
