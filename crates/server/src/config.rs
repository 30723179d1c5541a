//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROXIMITY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PROXIMITY_HOST` - Bind address (default: 127.0.0.1)
//! - `PROXIMITY_PORT` - Listen port (default: 3000)
//! - `PROXIMITY_ZONE_IDLE_SECS` - Seconds a user may go unseen before leaving a zone (default: 300)
//! - `PROXIMITY_TOUCH_IDLE_SECS` - Seconds a display touch is remembered (default: 60)
//! - `PROXIMITY_BINDING_IDLE_SECS` - Seconds a beacon binding overrides rotation (default: 60)
//! - `PROXIMITY_SWEEP_INTERVAL_SECS` - Eviction sweep period, `0` disables it (default: 30)
//! - `PROXIMITY_STORE_MAX_ATTEMPTS` - Compare-and-swap attempts per registry write (default: 5)
//! - `PROXIMITY_CATALOG_CACHE_SECS` - Display endpoint cache TTL (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;
use thiserror::Error;

use proximity_core::session::IdleThresholds;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Proximity server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session tuning
    pub sessions: SessionConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Idle thresholds, sweep schedule and store retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub thresholds: IdleThresholds,
    /// `None` when the in-process scheduler is disabled.
    pub sweep_interval: Option<Duration>,
    pub store_max_attempts: u32,
    pub catalog_cache_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thresholds: IdleThresholds::default(),
            sweep_interval: Some(Duration::from_secs(30)),
            store_max_attempts: 5,
            catalog_cache_ttl: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PROXIMITY_DATABASE_URL")?;
        let host = get_parsed_or_default::<IpAddr>("PROXIMITY_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("PROXIMITY_PORT", "3000")?;
        let sessions = SessionConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            sessions,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SessionConfig {
    /// Load only the session tuning variables.
    ///
    /// Used on its own by the CLI, which has no listener to configure.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for a malformed or zero threshold.
    pub fn from_env() -> Result<Self, ConfigError> {
        let thresholds = IdleThresholds {
            zone: positive_secs_env("PROXIMITY_ZONE_IDLE_SECS", "300")?,
            touch: positive_secs_env("PROXIMITY_TOUCH_IDLE_SECS", "60")?,
            binding: positive_secs_env("PROXIMITY_BINDING_IDLE_SECS", "60")?,
        };

        let interval = get_parsed_or_default::<u64>("PROXIMITY_SWEEP_INTERVAL_SECS", "30")?;
        let sweep_interval = (interval > 0).then(|| Duration::from_secs(interval));

        let store_max_attempts = get_env_or_default("PROXIMITY_STORE_MAX_ATTEMPTS", "5");
        let store_max_attempts = parse_positive("PROXIMITY_STORE_MAX_ATTEMPTS", &store_max_attempts)?;
        let store_max_attempts = u32::try_from(store_max_attempts).map_err(|e| {
            ConfigError::InvalidEnvVar("PROXIMITY_STORE_MAX_ATTEMPTS".to_string(), e.to_string())
        })?;

        let cache_secs = get_parsed_or_default::<u64>("PROXIMITY_CATALOG_CACHE_SECS", "30")?;

        Ok(Self {
            thresholds,
            sweep_interval,
            store_max_attempts,
            catalog_cache_ttl: Duration::from_secs(cache_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a strictly positive integer.
fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    match parse_value::<u64>(key, value)? {
        0 => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        n => Ok(n),
    }
}

/// Parse a strictly positive number of seconds into a `TimeDelta`.
fn parse_positive_secs(key: &str, value: &str) -> Result<TimeDelta, ConfigError> {
    let secs = parse_positive(key, value)?;
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| ConfigError::InvalidEnvVar(key.to_string(), "out of range".to_string()))
}

fn positive_secs_env(key: &str, default: &str) -> Result<TimeDelta, ConfigError> {
    parse_positive_secs(key, &get_env_or_default(key, default))
}
