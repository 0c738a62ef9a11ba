//! src/domain/mod.rs
mod newsletter;
pub use newsletter::{Newsletter, NewsletterId};

mod newsletter_store;
pub use newsletter_store::NewsletterStore;

mod subscriber;
pub use subscriber::{
    ChangeAction, PendingChanges, Subscriber, SubscriberId, Subscription, SubscriptionStatus,
};

pub mod subscriber_email;
pub use subscriber_email::SubscriberEmail;

mod subscriber_store;
pub use subscriber_store::{StaleSubscriber, SubscriberStore};
