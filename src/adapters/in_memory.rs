//! src/adapters/in_memory.rs
use crate::configuration::NewsletterSettings;
use crate::domain::{
    Newsletter, NewsletterId, NewsletterStore, StaleSubscriber, Subscriber, SubscriberEmail,
    SubscriberId, SubscriberStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Subscribers {
    next_id: SubscriberId,
    by_id: HashMap<SubscriberId, Subscriber>,
}

/// Process local subscriber storage, for development and tests.
#[derive(Default)]
pub struct InMemorySubscriberStore {
    inner: Mutex<Subscribers>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Subscribers>, anyhow::Error> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Subscriber store lock is poisoned"))
    }

    pub fn count(&self) -> usize {
        self.inner.lock().map(|s| s.by_id.len()).unwrap_or_default()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, anyhow::Error> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, anyhow::Error> {
        Ok(self
            .lock()?
            .by_id
            .values()
            .find(|s| &s.email == email)
            .cloned())
    }

    async fn create(&self, email: &SubscriberEmail) -> Result<Subscriber, anyhow::Error> {
        let mut subscribers = self.lock()?;
        if let Some(existing) = subscribers.by_id.values().find(|s| &s.email == email) {
            return Ok(existing.clone());
        }

        subscribers.next_id += 1;
        let subscriber = Subscriber::new(subscribers.next_id, email.clone());
        subscribers
            .by_id
            .insert(subscriber.id, subscriber.clone());

        Ok(subscriber)
    }

    async fn save(&self, subscriber: &mut Subscriber) -> Result<(), anyhow::Error> {
        let mut subscribers = self.lock()?;
        let stored = subscribers
            .by_id
            .get_mut(&subscriber.id)
            .ok_or_else(|| anyhow::anyhow!("Subscriber {} does not exist", subscriber.id))?;
        if stored.version() != subscriber.version() {
            return Err(StaleSubscriber(subscriber.id).into());
        }

        subscriber.mark_saved();
        *stored = subscriber.clone();
        Ok(())
    }
}

pub struct InMemoryNewsletterStore {
    newsletters: HashMap<NewsletterId, Newsletter>,
}

impl InMemoryNewsletterStore {
    pub fn new(newsletters: &[NewsletterSettings]) -> Self {
        let newsletters = newsletters
            .iter()
            .map(|n| {
                let id = NewsletterId::new(n.id.clone());
                (
                    id.clone(),
                    Newsletter {
                        id,
                        name: n.name.clone(),
                    },
                )
            })
            .collect();

        Self { newsletters }
    }
}

#[async_trait]
impl NewsletterStore for InMemoryNewsletterStore {
    async fn find(&self, id: &NewsletterId) -> Result<Option<Newsletter>, anyhow::Error> {
        Ok(self.newsletters.get(id).cloned())
    }
}
