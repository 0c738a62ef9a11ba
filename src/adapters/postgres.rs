//! src/adapters/postgres.rs
use crate::configuration::NewsletterSettings;
use crate::domain::{
    Newsletter, NewsletterId, NewsletterStore, PendingChanges, Subscriber, SubscriberEmail,
    StaleSubscriber, SubscriberId, SubscriberStore, Subscription, SubscriptionStatus,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    mail: String,
    changes: String,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    newsletter_id: String,
    status: String,
    source: String,
    changed_at: DateTime<Utc>,
}

pub struct PostgresSubscriberStore {
    pool: PgPool,
}

impl PostgresSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: SubscriberRow) -> Result<Subscriber, anyhow::Error> {
        let email = SubscriberEmail::parse(row.mail)
            .with_context(|| format!("Subscriber {} has an invalid email", row.id))?;
        let changes: PendingChanges = serde_json::from_str(&row.changes)
            .with_context(|| format!("Subscriber {} has corrupt pending changes", row.id))?;

        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT newsletter_id, status, source, changed_at
            FROM subscriptions
            WHERE subscriber_id = $1
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load subscriptions")?;

        let mut subscriptions = BTreeMap::new();
        for r in rows {
            let status = SubscriptionStatus::try_from(r.status).map_err(anyhow::Error::msg)?;
            subscriptions.insert(
                NewsletterId::new(r.newsletter_id),
                Subscription {
                    status,
                    source: r.source,
                    changed_at: r.changed_at,
                },
            );
        }

        Ok(Subscriber::from_parts(
            row.id,
            email,
            subscriptions,
            changes,
            row.version,
        ))
    }
}

#[async_trait]
impl SubscriberStore for PostgresSubscriberStore {
    #[tracing::instrument(name = "Load subscriber by id", skip(self))]
    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, anyhow::Error> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, mail, changes, version FROM subscribers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query subscriber by id")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "Load subscriber by email", skip(self))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, anyhow::Error> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, mail, changes, version FROM subscribers WHERE mail = $1",
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query subscriber by email")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "Saving new subscriber in the database", skip(self))]
    async fn create(&self, email: &SubscriberEmail) -> Result<Subscriber, anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO subscribers (mail, changes, created_at)
            VALUES ($1, '{}', $2)
            ON CONFLICT (mail) DO NOTHING
            "#,
        )
        .bind(email.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:#?}", e);
            e
        })
        .context("Failed to insert subscriber")?;

        self.find_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Subscriber {} vanished after insert", email))
    }

    #[tracing::instrument(
        name = "Saving subscriber state in the database",
        skip(self, subscriber),
        fields(subscriber_id = subscriber.id)
    )]
    async fn save(&self, subscriber: &mut Subscriber) -> Result<(), anyhow::Error> {
        let changes = serde_json::to_string(subscriber.changes())
            .context("Failed to serialize pending changes")?;

        let mut transaction = self
            .pool
            .begin()
            .await
            .context("Failed to acquire a Postgres connection from the pool")?;

        let updated = sqlx::query(
            r#"
            UPDATE subscribers SET changes = $2, version = version + 1
            WHERE id = $1 AND version = $3
            "#,
        )
        .bind(subscriber.id)
        .bind(changes)
        .bind(subscriber.version())
        .execute(&mut *transaction)
        .await
        .context("Failed to update pending changes")?;
        if updated.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM subscribers WHERE id = $1)")
                    .bind(subscriber.id)
                    .fetch_one(&mut *transaction)
                    .await
                    .context("Failed to check for the subscriber")?;
            if exists {
                return Err(StaleSubscriber(subscriber.id).into());
            }
            anyhow::bail!("Subscriber {} does not exist", subscriber.id);
        }

        for (newsletter_id, subscription) in subscriber.subscriptions() {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (subscriber_id, newsletter_id, status, source, changed_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (subscriber_id, newsletter_id) DO UPDATE
                SET status = EXCLUDED.status,
                    source = EXCLUDED.source,
                    changed_at = EXCLUDED.changed_at
                "#,
            )
            .bind(subscriber.id)
            .bind(newsletter_id.as_ref())
            .bind(subscription.status.as_str())
            .bind(&subscription.source)
            .bind(subscription.changed_at)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Failed to store subscription to {}", newsletter_id))?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit SQL transaction to save a subscriber")?;

        subscriber.mark_saved();
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct NewsletterRow {
    id: String,
    name: String,
}

pub struct PostgresNewsletterStore {
    pool: PgPool,
}

impl PostgresNewsletterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Makes sure every configured newsletter exists, updating display names.
    #[tracing::instrument(name = "Registering configured newsletters", skip(self, newsletters))]
    pub async fn register(&self, newsletters: &[NewsletterSettings]) -> Result<(), anyhow::Error> {
        for newsletter in newsletters {
            sqlx::query(
                r#"
                INSERT INTO newsletters (id, name) VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
                "#,
            )
            .bind(&newsletter.id)
            .bind(&newsletter.name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to register newsletter {}", newsletter.id))?;
        }
        Ok(())
    }
}

#[async_trait]
impl NewsletterStore for PostgresNewsletterStore {
    #[tracing::instrument(name = "Load newsletter", skip(self))]
    async fn find(&self, id: &NewsletterId) -> Result<Option<Newsletter>, anyhow::Error> {
        let row = sqlx::query_as::<_, NewsletterRow>("SELECT id, name FROM newsletters WHERE id = $1")
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query newsletter")?;

        Ok(row.map(|r| Newsletter {
            id: NewsletterId::new(r.id),
            name: r.name,
        }))
    }
}
