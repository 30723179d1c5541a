//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod sweep;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid session configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] proximity_server::config::ConfigError),

    /// The eviction sweep could not run.
    #[error("Sweep failed: {0}")]
    Sweep(#[from] proximity_server::services::ServiceError),
}

/// Read the database URL, honouring a `.env` file.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("PROXIMITY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("PROXIMITY_DATABASE_URL"))
}
