//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{PgAuditLedger, PgCatalog, PgSessionStore};
use crate::services::SessionService;

/// The session service wired to `PostgreSQL`.
pub type PgSessionService = SessionService<PgSessionStore, PgCatalog, PgAuditLedger>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    sessions: Arc<PgSessionService>,
}

impl AppState {
    /// Create a new application state and wire the session service.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let sessions = SessionService::new(
            PgSessionStore::new(pool.clone()),
            PgCatalog::new(pool.clone(), config.sessions.catalog_cache_ttl),
            PgAuditLedger::new(pool.clone()),
            config.sessions,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions: Arc::new(sessions),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the session service.
    #[must_use]
    pub fn sessions(&self) -> &Arc<PgSessionService> {
        &self.inner.sessions
    }
}
