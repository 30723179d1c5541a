//! Storage for the Proximity server.
//!
//! # Database: `proximity`
//!
//! ## Catalog tables (read-only at runtime)
//!
//! - `proximity.client`, `proximity.client_spot`, `proximity.zone`
//! - `proximity.location_device` - Beacons, optionally bound to a notification
//! - `proximity.display_endpoint` and `proximity.display_endpoint_notification`
//! - `proximity.notification`, `proximity.coupon`, `proximity.user`
//!
//! ## Session tables
//!
//! - `proximity.session_registry` - One JSONB document per registry, versioned
//!   for compare-and-swap writes
//! - `proximity.user_coupon` - Append-only coupon issue ledger
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p proximity-cli -- migrate
//! ```
//!
//! Every store is reached through a trait ([`ConfigReader`], [`SessionStore`],
//! [`AuditLedger`]) with a `PostgreSQL` and an in-memory implementation.

pub mod catalog;
pub mod ledger;
pub mod memory;
pub mod sessions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{ConfigReader, PgCatalog};
pub use ledger::{AuditLedger, PgAuditLedger};
pub use memory::{LedgerEntry, MemoryAuditLedger, MemoryCatalog, MemorySessionStore};
pub use sessions::{PgSessionStore, SessionStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Version mismatch on a compare-and-swap write, or a constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
