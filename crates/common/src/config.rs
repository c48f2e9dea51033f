//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration. Without it the change feed stays in-process.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Admin console credentials.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Outbound email. Without it notifications are only logged.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Show engine tuning.
    #[serde(default)]
    pub show: ShowConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis channels.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Admin console configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer tokens accepted on admin endpoints.
    #[serde(default)]
    pub tokens: Vec<AdminToken>,
}

/// A single admin credential.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminToken {
    /// Admin identity recorded in edit history.
    pub email: String,
    /// Bearer token.
    pub token: String,
}

/// SMTP configuration for submitter notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Use STARTTLS instead of implicit TLS.
    #[serde(default = "default_true")]
    pub starttls: bool,
}

/// Show engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowConfig {
    /// Per-subscription buffer of pending snapshots.
    #[serde(default = "default_live_buffer")]
    pub live_buffer: usize,
    /// Retries for transient store failures on aggregate updates.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// First retry delay in milliseconds (doubles on each attempt).
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            live_buffer: default_live_buffer(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_redis_prefix() -> String {
    "talentshow".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Talent Show".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_live_buffer() -> usize {
    32
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_initial_delay_ms() -> u64 {
    50
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `TALENTSHOW_ENV`)
    /// 4. Environment variables with `TALENTSHOW_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("TALENTSHOW_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALENTSHOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TALENTSHOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Look up the admin identity for a bearer token.
    #[must_use]
    pub fn admin_for_token(&self, token: &str) -> Option<&str> {
        self.admin
            .tokens
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.email.as_str())
    }
}
