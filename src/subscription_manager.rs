//! src/subscription_manager.rs
use crate::domain::{
    ChangeAction, Newsletter, NewsletterStore, Subscriber, SubscriberStore, SubscriptionStatus,
};
use crate::email::EmailClient;
use crate::link_signer::LinkSigner;
use crate::messages::Messages;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Source recorded on every subscription change made through this service.
pub const SOURCE: &str = "newsletter_signup";

pub struct ApplicationBaseUrl(pub String);

/// Applies subscription state transitions and mails combined confirmation
/// links for whatever is still pending.
pub struct SubscriptionManager {
    subscribers: Arc<dyn SubscriberStore>,
    newsletters: Arc<dyn NewsletterStore>,
    email_client: Arc<dyn EmailClient>,
    signer: LinkSigner,
    base_url: ApplicationBaseUrl,
    messages: Messages,
}

impl SubscriptionManager {
    pub fn new(
        subscribers: Arc<dyn SubscriberStore>,
        newsletters: Arc<dyn NewsletterStore>,
        email_client: Arc<dyn EmailClient>,
        signer: LinkSigner,
        base_url: ApplicationBaseUrl,
        messages: Messages,
    ) -> Self {
        Self {
            subscribers,
            newsletters,
            email_client,
            signer,
            base_url,
            messages,
        }
    }

    /// With `confirm` set the subscription stays unconfirmed until the
    /// subscriber follows the combined link. Already subscribed addresses
    /// are left untouched.
    #[tracing::instrument(
        name = "Subscribing",
        skip(self, subscriber, newsletter),
        fields(subscriber_id = subscriber.id, newsletter_id = %newsletter.id)
    )]
    pub async fn subscribe(
        &self,
        subscriber: &mut Subscriber,
        newsletter: &Newsletter,
        confirm: bool,
        source: &str,
    ) -> Result<(), anyhow::Error> {
        if confirm {
            if subscriber.is_subscribed(&newsletter.id) {
                return Ok(());
            }
            subscriber.set_status(&newsletter.id, SubscriptionStatus::Unconfirmed, source);
            subscriber.add_change(&newsletter.id, ChangeAction::Subscribe);
        } else {
            subscriber.set_status(&newsletter.id, SubscriptionStatus::Subscribed, source);
            subscriber.drop_change(&newsletter.id);
        }

        self.subscribers
            .save(subscriber)
            .await
            .context("Failed to save subscription")
    }

    #[tracing::instrument(
        name = "Unsubscribing",
        skip(self, subscriber, newsletter),
        fields(subscriber_id = subscriber.id, newsletter_id = %newsletter.id)
    )]
    pub async fn unsubscribe(
        &self,
        subscriber: &mut Subscriber,
        newsletter: &Newsletter,
        confirm: bool,
        source: &str,
    ) -> Result<(), anyhow::Error> {
        if confirm && subscriber.is_subscribed(&newsletter.id) {
            subscriber.add_change(&newsletter.id, ChangeAction::Unsubscribe);
        } else {
            subscriber.set_status(&newsletter.id, SubscriptionStatus::Unsubscribed, source);
            subscriber.drop_change(&newsletter.id);
        }

        self.subscribers
            .save(subscriber)
            .await
            .context("Failed to save unsubscription")
    }

    /// Returns `false` when nothing is pending and no mail went out.
    #[tracing::instrument(
        name = "Sending confirmations",
        skip(self, subscriber),
        fields(subscriber_id = subscriber.id)
    )]
    pub async fn send_confirmations(&self, subscriber: &Subscriber) -> Result<bool, anyhow::Error> {
        if !subscriber.has_changes() {
            return Ok(false);
        }

        let timestamp = Utc::now().timestamp();
        let hash = self
            .signer
            .sign_combined(&subscriber.email, subscriber.changes(), timestamp)?;
        let confirmation_link = format!(
            "{}/confirm-combined/{}/{}/{}",
            self.base_url.0.trim_end_matches('/'),
            subscriber.id,
            timestamp,
            hash
        );

        let mut names = Vec::with_capacity(subscriber.changes().len());
        for newsletter_id in subscriber.changes().keys() {
            let name = self
                .newsletters
                .find(newsletter_id)
                .await?
                .map(|n| n.name)
                .unwrap_or_else(|| newsletter_id.to_string());
            names.push(htmlescape::encode_minimal(&name));
        }

        let html_content = self
            .messages
            .confirmation_body(&names.join(", "), &confirmation_link);

        self.email_client
            .send_email(
                &subscriber.email,
                self.messages.confirmation_subject(),
                &html_content,
            )
            .await
            .context("Failed to send a confirmation email")?;

        Ok(true)
    }
}
