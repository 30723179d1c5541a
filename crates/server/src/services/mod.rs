//! Business operations over the session registries.
//!
//! [`SessionService`] is stateless between calls: every operation takes its
//! inputs explicitly, reads what it needs from the catalog, and applies one
//! engine step per registry inside a compare-and-swap critical section.
//!
//! # Failure handling
//!
//! - Malformed input and unknown catalog entities are rejected before any
//!   state is touched.
//! - A catalog that cannot be read surfaces as [`ServiceError::Unavailable`].
//! - A session store that cannot be read or written is logged and the
//!   operation degrades to a no-op for that registry; callers still get a
//!   well-formed, possibly empty, result.

mod location;
mod notifications;
mod registry;
mod sweep;
#[cfg(test)]
mod test_support;
mod touch;

use thiserror::Error;

pub use location::LocationReport;
pub use registry::read_modify_write;
pub use sweep::{SweepReport, spawn_sweeper};
pub use touch::TouchEvent;

use crate::config::SessionConfig;
use crate::db::{AuditLedger, ConfigReader, RepositoryError, SessionStore};

/// Errors surfaced by business operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing identifier, or an unsupported enum value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown display endpoint, location device, zone or user.
    #[error("not found: {0}")]
    NotFound(String),

    /// The catalog could not be read; no session state was changed.
    #[error("catalog unavailable: {0}")]
    Unavailable(#[source] RepositoryError),
}

/// Proximity session operations.
///
/// Generic over its three collaborators so the same logic runs against
/// `PostgreSQL` in production and in-memory stores in tests.
#[derive(Debug, Clone)]
pub struct SessionService<S, C, L> {
    store: S,
    catalog: C,
    ledger: L,
    config: SessionConfig,
}

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    #[must_use]
    pub const fn new(store: S, catalog: C, ledger: L, config: SessionConfig) -> Self {
        Self {
            store,
            catalog,
            ledger,
            config,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }
}
