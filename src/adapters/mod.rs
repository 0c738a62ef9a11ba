//! src/adapters/mod.rs
mod in_memory;
pub use in_memory::{InMemoryNewsletterStore, InMemorySubscriberStore};

mod postgres;
pub use postgres::{PostgresNewsletterStore, PostgresSubscriberStore};
