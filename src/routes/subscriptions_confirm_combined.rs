//! src/routes/subscriptions_confirm_combined.rs
use crate::domain::{ChangeAction, SubscriberId, SubscriberStore, SubscriptionStatus};
use crate::link_signer::LinkSigner;
use crate::messages::Messages;
use crate::routes::{ConfirmationError, ConfirmationResponse};
use crate::subscription_manager::SOURCE;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct CombinedParameters {
    snid: String,
    timestamp: String,
    hash: String,
}

#[tracing::instrument(
    name = "Confirm combined subscription changes",
    skip(parameters, subscribers, signer, messages),
    fields(subscriber_id = %parameters.snid)
)]
pub async fn confirm_combined(
    parameters: web::Path<CombinedParameters>,
    subscribers: web::Data<dyn SubscriberStore>,
    signer: web::Data<LinkSigner>,
    messages: web::Data<Messages>,
) -> Result<HttpResponse, ConfirmationError> {
    let not_found = || ConfirmationError::NotFound(messages.generic_failure().into());
    let unexpected =
        |e: anyhow::Error| ConfirmationError::UnexpectedError(messages.generic_failure().into(), e);

    let (Ok(snid), Ok(timestamp)) = (
        parameters.snid.parse::<SubscriberId>(),
        parameters.timestamp.parse::<i64>(),
    ) else {
        return Err(not_found());
    };

    let mut subscriber = subscribers
        .find_by_id(snid)
        .await
        .map_err(unexpected)?
        .ok_or_else(not_found)?;

    if !subscriber.has_changes() {
        return Ok(HttpResponse::Ok().json(ConfirmationResponse {
            success: true,
            message: messages.no_pending_changes().into(),
        }));
    }

    if !signer.verify_combined(
        &subscriber.email,
        subscriber.changes(),
        timestamp,
        &parameters.hash,
    ) {
        tracing::warn!("Rejected a combined confirmation link with a mismatching hash");
        return Err(not_found());
    }

    if signer.is_expired(timestamp) {
        return Err(ConfirmationError::Expired(messages.link_expired().into()));
    }

    for (newsletter_id, action) in subscriber.take_changes() {
        let status = match action {
            ChangeAction::Subscribe => SubscriptionStatus::Subscribed,
            ChangeAction::Unsubscribe => SubscriptionStatus::Unsubscribed,
        };
        subscriber.set_status(&newsletter_id, status, SOURCE);
    }

    subscribers.save(&mut subscriber).await.map_err(unexpected)?;

    Ok(HttpResponse::Ok().json(ConfirmationResponse {
        success: true,
        message: messages.changes_confirmed(subscriber.email.as_ref()),
    }))
}
