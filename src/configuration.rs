//! src/configuration.rs
use crate::messages::Language;
use config::{Config, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub storage: StorageSettings,
    pub database: Option<DatabaseSettings>,
    pub email: EmailSettings,
    #[serde(default)]
    pub newsletters: Vec<NewsletterSettings>,
}

impl Settings {
    pub fn set_email_url(&mut self, email_url: String) {
        self.email.api_url = email_url;
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub base_url: String,
    pub hmac_secret: Secret<String>,
    /// Seconds a confirmation link stays valid.
    #[serde(default = "default_hash_expiration")]
    pub hash_expiration: i64,
    #[serde(default)]
    pub language: Language,
}

fn default_hash_expiration() -> i64 {
    86400
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name
        ))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailSettings {
    pub api_key: Secret<String>,
    pub api_url: String,
    pub sender_name: String,
    pub sender_email: String,
    #[serde(default = "default_timeout_milliseconds")]
    pub timeout_milliseconds: u64,
}

fn default_timeout_milliseconds() -> u64 {
    10_000
}

impl EmailSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewsletterSettings {
    pub id: String,
    pub name: String,
}

#[derive(PartialEq)]
pub enum Environment {
    Local,
    Production,
}
impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_ref() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            _ => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                s
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if not specified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base")).required(true))
        .add_source(File::from(configuration_directory.join(environment.as_str())).required(true))
        // E.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;

    if environment == Environment::Local {
        load_email_file(&configuration_directory.join("email"))?;
    }

    if let Some(email_settings) = email_settings_from(std::env::vars())? {
        settings.email = email_settings;
    }

    Ok(settings)
}

const EMAIL_PREFIX: &str = "EMAIL_CLIENT_";

/// Loads mail credentials from a dotenv file into the environment. A missing
/// file is fine, an unreadable or malformed one is not.
fn load_email_file(path: &std::path::Path) -> Result<(), config::ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(config::ConfigError::Message(format!(
            "Failed to load {}: {}",
            path.display(),
            e
        ))),
    }
}

/// `None` when no `EMAIL_CLIENT_*` variable is set. Once any of them is set
/// the whole group must be complete.
fn email_settings_from<I>(vars: I) -> Result<Option<EmailSettings>, config::ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with(EMAIL_PREFIX))
        .collect();
    if vars.is_empty() {
        return Ok(None);
    }

    envy::prefixed(EMAIL_PREFIX)
        .from_iter::<_, EmailSettings>(vars)
        .map(Some)
        .map_err(|e| {
            config::ConfigError::Message(format!("Incomplete {}* settings: {}", EMAIL_PREFIX, e))
        })
}
