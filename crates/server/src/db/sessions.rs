//! Versioned storage for the session registries.
//!
//! Each registry is stored whole under its key together with a version
//! token. Writes are compare-and-swap on that token: a writer that read an
//! older version is rejected with [`RepositoryError::Conflict`] instead of
//! silently overwriting a concurrent update.

use std::future::Future;

use sqlx::PgPool;
use tracing::instrument;

use proximity_core::session::{Registry, Versioned};

use super::RepositoryError;

/// Keyed, versioned store for singleton registries.
pub trait SessionStore: Send + Sync {
    /// Read a registry and the version it was stored at.
    fn load<R: Registry>(
        &self,
    ) -> impl Future<Output = Result<Option<Versioned<R>>, RepositoryError>> + Send;

    /// Write a registry if the stored version still equals `expected`.
    ///
    /// `expected = None` creates the registry and fails if one already
    /// exists. Returns the new version.
    fn save<R: Registry>(
        &self,
        registry: &R,
        expected: Option<i64>,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;
}

/// `PostgreSQL` session store over `proximity.session_registry`.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PgSessionStore {
    #[instrument(skip(self), fields(key = R::KEY))]
    async fn load<R: Registry>(&self) -> Result<Option<Versioned<R>>, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, serde_json::Value)>(
            "SELECT version, body FROM proximity.session_registry WHERE key = $1",
        )
        .bind(R::KEY)
        .fetch_optional(&self.pool)
        .await?;

        let Some((version, body)) = row else {
            return Ok(None);
        };

        let registry = serde_json::from_value::<R>(body).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid {} document: {e}", R::KEY))
        })?;

        Ok(Some(Versioned { version, registry }))
    }

    #[instrument(skip(self, registry), fields(key = R::KEY))]
    async fn save<R: Registry>(
        &self,
        registry: &R,
        expected: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        let body = serde_json::to_value(registry).map_err(|e| {
            RepositoryError::DataCorruption(format!("cannot encode {}: {e}", R::KEY))
        })?;

        let Some(expected) = expected else {
            return sqlx::query_scalar::<_, i64>(
                "INSERT INTO proximity.session_registry (key, version, body)
                 VALUES ($1, 1, $2)
                 RETURNING version",
            )
            .bind(R::KEY)
            .bind(body)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!("{} already exists", R::KEY));
                }
                RepositoryError::Database(e)
            });
        };

        sqlx::query_scalar::<_, i64>(
            "UPDATE proximity.session_registry
             SET body = $2, version = version + 1, updated_at = NOW()
             WHERE key = $1 AND version = $3
             RETURNING version",
        )
        .bind(R::KEY)
        .bind(body)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::Conflict(format!("{} changed since version {expected}", R::KEY))
        })
    }
}
