//! src/domain/subscriber_email.rs
use serde::{Deserialize, Serialize};
use validator::validate_email;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No email address given")]
    Empty,
    #[error("{0} is not a valid email address")]
    Invalid(String),
}

/// An address accepted for subscription. Surrounding whitespace from form
/// input is dropped before validation and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(raw: String) -> Result<Self, Error> {
        let address = raw.trim();
        if address.is_empty() {
            return Err(Error::Empty);
        }

        if !validate_email(address) {
            return Err(Error::Invalid(address.to_string()));
        }

        Ok(Self(address.to_string()))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
