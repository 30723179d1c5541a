//! Compare-and-swap critical section around a registry.

use tracing::{debug, warn};

use proximity_core::session::{Change, Registry, Versioned};

use super::SessionService;
use crate::db::{AuditLedger, ConfigReader, RepositoryError, SessionStore};

/// Load a registry, apply `apply`, and write it back if it changed.
///
/// A missing registry starts from [`Registry::fresh`]. When the write loses a
/// race with another writer the whole load/apply/save cycle is repeated
/// against the newer version, up to `max_attempts` times. `apply` must
/// therefore be a pure function of the registry it is handed.
pub async fn read_modify_write<S, R, T, F>(
    store: &S,
    max_attempts: u32,
    mut apply: F,
) -> Result<Change<T>, RepositoryError>
where
    S: SessionStore,
    R: Registry,
    F: FnMut(&mut R) -> Change<T> + Send,
    T: Send,
{
    for attempt in 1..=max_attempts {
        let (mut registry, expected) = match store.load::<R>().await? {
            Some(Versioned { version, registry }) => (registry, Some(version)),
            None => (R::fresh(), None),
        };

        let change = apply(&mut registry);
        if !change.is_modified() {
            return Ok(change);
        }

        match store.save(&registry, expected).await {
            Ok(version) => {
                debug!(key = R::KEY, version, attempt, "Registry saved");
                return Ok(change);
            }
            Err(RepositoryError::Conflict(reason)) => {
                debug!(key = R::KEY, attempt, %reason, "Registry write lost a race, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    warn!(key = R::KEY, max_attempts, "Registry write kept conflicting");
    Err(RepositoryError::Conflict(format!(
        "{} still contended after {max_attempts} attempts",
        R::KEY
    )))
}

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    /// [`read_modify_write`] with this service's store and retry budget.
    pub(crate) async fn update<R, T, F>(&self, apply: F) -> Result<Change<T>, RepositoryError>
    where
        R: Registry,
        F: FnMut(&mut R) -> Change<T> + Send,
        T: Send,
    {
        read_modify_write(&self.store, self.config.store_max_attempts, apply).await
    }
}
