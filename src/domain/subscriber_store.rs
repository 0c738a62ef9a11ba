//! src/domain/subscriber_store.rs
use crate::domain::{Subscriber, SubscriberEmail, SubscriberId};
use async_trait::async_trait;

/// Persistence of subscribers together with their subscriptions and
/// pending changes. Implementations must keep email addresses unique.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, anyhow::Error>;

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, anyhow::Error>;

    /// Creates a subscriber for `email`, or returns the existing one when
    /// another request registered the same address first.
    async fn create(&self, email: &SubscriberEmail) -> Result<Subscriber, anyhow::Error>;

    /// Writes subscriptions and pending changes in one step and bumps the
    /// version of `subscriber`. Fails with [`StaleSubscriber`] when another
    /// save landed since `subscriber` was loaded.
    async fn save(&self, subscriber: &mut Subscriber) -> Result<(), anyhow::Error>;
}

#[derive(thiserror::Error, Debug)]
#[error("Subscriber {0} was changed by another request")]
pub struct StaleSubscriber(pub SubscriberId);
