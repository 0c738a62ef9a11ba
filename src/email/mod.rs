//! src/email/mod.rs
use crate::domain::SubscriberEmail;
use async_trait::async_trait;

mod brevo;
pub use brevo::Brevo;

/// Outbound transactional mail.
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error>;
}
