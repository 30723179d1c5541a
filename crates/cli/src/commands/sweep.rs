//! One-off eviction sweep.
//!
//! Runs the same pass the server's scheduler runs, for deployments that
//! disable the in-process sweeper (`PROXIMITY_SWEEP_INTERVAL_SECS=0`) and
//! drive eviction from cron instead.

use chrono::Utc;
use proximity_server::config::SessionConfig;
use proximity_server::db::{self, PgAuditLedger, PgCatalog, PgSessionStore};
use proximity_server::services::SessionService;

use super::{CommandError, database_url};

/// Run one eviction pass against the configured database.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;
    let config = SessionConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let service = SessionService::new(
        PgSessionStore::new(pool.clone()),
        PgCatalog::new(pool.clone(), config.catalog_cache_ttl),
        PgAuditLedger::new(pool),
        config,
    );

    let report = service.run_eviction_sweep(Utc::now()).await?;

    tracing::info!(
        users_evicted = report.users_evicted,
        displays_reset = report.displays.total(),
        zone_registry_written = report.zone_registry_written,
        display_registry_written = report.display_registry_written,
        "Sweep finished"
    );
    Ok(())
}
