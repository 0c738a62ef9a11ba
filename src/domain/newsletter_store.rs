//! src/domain/newsletter_store.rs
use crate::domain::{Newsletter, NewsletterId};
use async_trait::async_trait;

#[async_trait]
pub trait NewsletterStore: Send + Sync {
    async fn find(&self, id: &NewsletterId) -> Result<Option<Newsletter>, anyhow::Error>;
}
