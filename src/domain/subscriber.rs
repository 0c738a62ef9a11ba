//! src/domain/subscriber.rs
use crate::domain::{NewsletterId, SubscriberEmail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SubscriberId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Unsubscribed,
    Subscribed,
    Unconfirmed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Unsubscribed => "unsubscribed",
            SubscriptionStatus::Subscribed => "subscribed",
            SubscriptionStatus::Unconfirmed => "unconfirmed",
        }
    }
}

impl TryFrom<String> for SubscriptionStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "unsubscribed" => Ok(SubscriptionStatus::Unsubscribed),
            "subscribed" => Ok(SubscriptionStatus::Subscribed),
            "unconfirmed" => Ok(SubscriptionStatus::Unconfirmed),
            other => Err(format!("{} is not a valid subscription status", other)),
        }
    }
}

/// A subscription change waiting for the subscriber's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Subscribe,
    Unsubscribe,
}

pub type PendingChanges = BTreeMap<NewsletterId, ChangeAction>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub status: SubscriptionStatus,
    pub source: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: SubscriberEmail,
    subscriptions: BTreeMap<NewsletterId, Subscription>,
    changes: PendingChanges,
    version: i64,
}

impl Subscriber {
    pub fn new(id: SubscriberId, email: SubscriberEmail) -> Self {
        Self::from_parts(id, email, BTreeMap::new(), PendingChanges::new(), 0)
    }

    pub fn from_parts(
        id: SubscriberId,
        email: SubscriberEmail,
        subscriptions: BTreeMap<NewsletterId, Subscription>,
        changes: PendingChanges,
        version: i64,
    ) -> Self {
        Self {
            id,
            email,
            subscriptions,
            changes,
            version,
        }
    }

    /// The number of saves this copy has seen. Stores refuse to save a copy
    /// whose version is behind the stored one.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub(crate) fn mark_saved(&mut self) {
        self.version += 1;
    }

    pub fn subscriptions(&self) -> &BTreeMap<NewsletterId, Subscription> {
        &self.subscriptions
    }

    pub fn status(&self, newsletter_id: &NewsletterId) -> Option<SubscriptionStatus> {
        self.subscriptions.get(newsletter_id).map(|s| s.status)
    }

    pub fn is_subscribed(&self, newsletter_id: &NewsletterId) -> bool {
        self.status(newsletter_id) == Some(SubscriptionStatus::Subscribed)
    }

    pub fn set_status(
        &mut self,
        newsletter_id: &NewsletterId,
        status: SubscriptionStatus,
        source: &str,
    ) {
        self.subscriptions.insert(
            newsletter_id.clone(),
            Subscription {
                status,
                source: source.to_owned(),
                changed_at: Utc::now(),
            },
        );
    }

    pub fn changes(&self) -> &PendingChanges {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn add_change(&mut self, newsletter_id: &NewsletterId, action: ChangeAction) {
        self.changes.insert(newsletter_id.clone(), action);
    }

    pub fn drop_change(&mut self, newsletter_id: &NewsletterId) {
        self.changes.remove(newsletter_id);
    }

    /// Hands the pending changes over to the caller, leaving none behind.
    pub fn take_changes(&mut self) -> PendingChanges {
        std::mem::take(&mut self.changes)
    }
}
