//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file).

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreBackend,
    pub database: Option<DatabaseConfig>,
    pub engine: EngineConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
    #[serde(default)]
    pub log_json: bool,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Which store implementation backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store (offline mode, tests)
    #[default]
    Memory,
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-topic buffer of the change feed
    #[serde(default = "default_feed_buffer")]
    pub feed_buffer: usize,
    /// Buffer of the notice (toast) channel
    #[serde(default = "default_notice_buffer")]
    pub notice_buffer: usize,
    /// Maximum characters in a post or comment
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_buffer: default_feed_buffer(),
            notice_buffer: default_notice_buffer(),
            max_content_length: default_max_content_length(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "agora".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_feed_buffer() -> usize {
    256
}

fn default_notice_buffer() -> usize {
    64
}

fn default_max_content_length() -> usize {
    10_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &'static str, default: usize| -> Result<usize, ConfigError> {
            match lookup(key) {
                Some(raw) => match raw.trim().parse() {
                    Ok(value) => Ok(value),
                    Err(_) => Err(ConfigError::InvalidValue(key, raw)),
                },
                None => Ok(default),
            }
        };

        let store = match lookup("STORE_BACKEND") {
            Some(raw) => match StoreBackend::parse(&raw) {
                Some(backend) => backend,
                None => return Err(ConfigError::InvalidValue("STORE_BACKEND", raw)),
            },
            None => StoreBackend::default(),
        };

        let database = match lookup("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: lookup("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            }),
            None => None,
        };

        if store == StoreBackend::Postgres && database.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }

        let max_content_length = parse_or("MAX_CONTENT_LENGTH", default_max_content_length())?;
        if max_content_length == 0 {
            return Err(ConfigError::InvalidValue("MAX_CONTENT_LENGTH", "0".to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
                log_json: lookup("LOG_JSON")
                    .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
            store,
            database,
            engine: EngineConfig {
                feed_buffer: parse_or("FEED_BUFFER", default_feed_buffer())?.max(1),
                notice_buffer: parse_or("NOTICE_BUFFER", default_notice_buffer())?.max(1),
                max_content_length,
            },
        })
    }

    /// In-memory configuration with defaults, for tests and offline use
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
                log_json: false,
            },
            store: StoreBackend::Memory,
            database: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
