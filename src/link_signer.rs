//! src/link_signer.rs
use crate::domain::{PendingChanges, SubscriberEmail};
use anyhow::Context;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};

/// Length of the hex encoded signature placed in confirmation links.
const HASH_LENGTH: usize = 20;

const COMBINED_ACTION: &str = "combined";

/// Signs and verifies the hashes embedded in confirmation links.
#[derive(Clone)]
pub struct LinkSigner {
    secret: Secret<String>,
    hash_expiration: i64,
}

impl LinkSigner {
    pub fn new(secret: Secret<String>, hash_expiration: i64) -> Self {
        Self {
            secret,
            hash_expiration,
        }
    }

    /// A link issued at `timestamp` expires `hash_expiration` seconds later.
    pub fn is_expired(&self, timestamp: i64) -> bool {
        timestamp < Utc::now().timestamp() - self.hash_expiration
    }

    fn mac(
        &self,
        email: &SubscriberEmail,
        action: &str,
        timestamp: i64,
    ) -> Result<Hmac<sha2::Sha256>, anyhow::Error> {
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .context("Invalid hmac secret")?;
        mac.update(email.as_ref().as_bytes());
        mac.update(action.as_bytes());
        mac.update(timestamp.to_string().as_bytes());
        Ok(mac)
    }

    pub fn sign(
        &self,
        email: &SubscriberEmail,
        action: &str,
        timestamp: i64,
    ) -> Result<String, anyhow::Error> {
        let tag = self.mac(email, action, timestamp)?.finalize().into_bytes();
        let mut hash = hex::encode(tag);
        hash.truncate(HASH_LENGTH);
        Ok(hash)
    }

    pub fn verify(&self, email: &SubscriberEmail, action: &str, timestamp: i64, hash: &str) -> bool {
        if hash.len() != HASH_LENGTH {
            return false;
        }

        let tag = match hex::decode(hash) {
            Ok(tag) => tag,
            Err(_) => {
                tracing::warn!("Invalid hex in confirmation hash");
                return false;
            }
        };

        let mac = match self.mac(email, action, timestamp) {
            Ok(mac) => mac,
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "Failed to set up link verification");
                return false;
            }
        };

        mac.verify_truncated_left(&tag).is_ok()
    }

    pub fn sign_combined(
        &self,
        email: &SubscriberEmail,
        changes: &PendingChanges,
        timestamp: i64,
    ) -> Result<String, anyhow::Error> {
        self.sign(email, &combined_action(changes)?, timestamp)
    }

    pub fn verify_combined(
        &self,
        email: &SubscriberEmail,
        changes: &PendingChanges,
        timestamp: i64,
        hash: &str,
    ) -> bool {
        match combined_action(changes) {
            Ok(action) => self.verify(email, &action, timestamp, hash),
            Err(_) => false,
        }
    }
}

/// A combined link covers exactly the pending changes it was issued for:
/// any change made afterwards invalidates it.
fn combined_action(changes: &PendingChanges) -> Result<String, anyhow::Error> {
    let serialized =
        serde_json::to_string(changes).context("Failed to serialize pending changes")?;
    Ok(format!("{}{}", COMBINED_ACTION, serialized))
}
