//! src/startup.rs
use crate::adapters::{
    InMemoryNewsletterStore, InMemorySubscriberStore, PostgresNewsletterStore,
    PostgresSubscriberStore,
};
use crate::configuration::{Settings, StorageBackend};
use crate::domain::{NewsletterStore, SubscriberStore};
use crate::email::{Brevo, EmailClient};
use crate::link_signer::LinkSigner;
use crate::messages::Messages;
use crate::routes::{confirm, confirm_combined, health_check, json_error_handler, subscribe};
use crate::subscription_manager::{ApplicationBaseUrl, SubscriptionManager};
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// The services the HTTP handlers delegate to.
pub struct Collaborators {
    pub subscribers: Arc<dyn SubscriberStore>,
    pub newsletters: Arc<dyn NewsletterStore>,
    pub email_client: Arc<dyn EmailClient>,
}

impl Collaborators {
    pub async fn from_settings(config: &Settings) -> Result<Self, anyhow::Error> {
        let email_client: Arc<dyn EmailClient> = Arc::new(Brevo::new(&config.email)?);

        match config.storage.backend {
            StorageBackend::Memory => Ok(Self {
                subscribers: Arc::new(InMemorySubscriberStore::new()),
                newsletters: Arc::new(InMemoryNewsletterStore::new(&config.newsletters)),
                email_client,
            }),
            StorageBackend::Postgres => {
                let database = config
                    .database
                    .as_ref()
                    .context("The postgres backend needs `database` settings")?;
                let pool = PgPool::connect(database.connection_string().expose_secret())
                    .await
                    .context("Failed to connect to Postgres.")?;
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to migrate the database")?;

                let newsletters = PostgresNewsletterStore::new(pool.clone());
                newsletters.register(&config.newsletters).await?;

                Ok(Self {
                    subscribers: Arc::new(PostgresSubscriberStore::new(pool)),
                    newsletters: Arc::new(newsletters),
                    email_client,
                })
            }
        }
    }
}

pub async fn build(config: Settings) -> Result<Application, anyhow::Error> {
    let collaborators = Collaborators::from_settings(&config).await?;
    build_with(config, collaborators)
}

pub fn build_with(
    config: Settings,
    collaborators: Collaborators,
) -> Result<Application, anyhow::Error> {
    let address = format!("{}:{}", config.application.host, config.application.port);
    let tcp_listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    let port = tcp_listener.local_addr()?.port();

    let server = run(tcp_listener, config, collaborators)?;

    Ok(Application { port, server })
}

pub fn run(
    listener: TcpListener,
    config: Settings,
    collaborators: Collaborators,
) -> Result<Server, std::io::Error> {
    let signer = LinkSigner::new(
        config.application.hmac_secret.clone(),
        config.application.hash_expiration,
    );
    let messages = Messages::new(config.application.language);

    let manager = web::Data::new(SubscriptionManager::new(
        collaborators.subscribers.clone(),
        collaborators.newsletters.clone(),
        collaborators.email_client,
        signer.clone(),
        ApplicationBaseUrl(config.application.base_url),
        messages,
    ));
    let subscribers: web::Data<dyn SubscriberStore> = web::Data::from(collaborators.subscribers);
    let newsletters: web::Data<dyn NewsletterStore> = web::Data::from(collaborators.newsletters);
    let signer = web::Data::new(signer);
    let messages = web::Data::new(messages);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::post().to(subscribe))
            .route(
                "/confirm/{action}/{snid}/{newsletter_id}/{timestamp}/{hash}",
                web::get().to(confirm),
            )
            .route(
                "/confirm-combined/{snid}/{timestamp}/{hash}",
                web::get().to(confirm_combined),
            )
            .app_data(
                web::JsonConfig::default()
                    .content_type(|_| true)
                    .content_type_required(false)
                    .error_handler(json_error_handler),
            )
            .app_data(subscribers.clone())
            .app_data(newsletters.clone())
            .app_data(manager.clone())
            .app_data(signer.clone())
            .app_data(messages.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
