//! Periodic eviction of idle sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

use proximity_core::session::{
    Change, DisplayRegistry, DisplaySweep, Registry, ZoneRegistry, sweep_displays, sweep_zones,
};
use proximity_core::{DisplayEndpointId, ZoneId};

use super::{ServiceError, SessionService};
use crate::db::{AuditLedger, ConfigReader, RepositoryError, SessionStore};

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub users_evicted: usize,
    pub displays: DisplaySweep,
    pub zone_registry_written: bool,
    pub display_registry_written: bool,
}

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    /// Evict idle user sessions, then reset stale display state.
    ///
    /// Each registry is written at most once. If the zone registry cannot be
    /// swept the display pass is skipped, since display presence is derived
    /// from the zones. The display pass reads the zone registry again rather
    /// than reusing the zone pass result, so a sighting that lands between
    /// the passes keeps its displays lit.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unavailable` if the display-to-zone mapping
    /// cannot be read from the catalog.
    #[instrument(skip(self))]
    pub async fn run_eviction_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ServiceError> {
        let endpoint_zones = self
            .catalog
            .display_endpoint_zones()
            .await
            .map_err(ServiceError::Unavailable)?;
        let mut report = SweepReport::default();

        match self.sweep_zone_registry(now).await {
            Ok(change) => {
                report.zone_registry_written = change.is_modified();
                report.users_evicted = change.into_inner();
            }
            Err(e) => {
                error!(error = %e, key = "zone-registry", "Zone sweep failed, skipping displays");
                return Ok(report);
            }
        }

        match self.sweep_display_registry(&endpoint_zones, now).await {
            Ok(change) => {
                report.display_registry_written = change.is_modified();
                report.displays = change.into_inner();
            }
            Err(e) => error!(error = %e, key = "display-registry", "Display sweep failed"),
        }

        info!(
            users_evicted = report.users_evicted,
            presence_cleared = report.displays.presence_cleared,
            touches_cleared = report.displays.touches_cleared,
            bindings_cleared = report.displays.bindings_cleared,
            "Eviction sweep complete"
        );
        Ok(report)
    }

    async fn sweep_zone_registry(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Change<usize>, RepositoryError> {
        let thresholds = self.config.thresholds;
        self.update(|registry: &mut ZoneRegistry| sweep_zones(registry, now, &thresholds))
            .await
    }

    /// Reset display state against the zone registry as currently stored.
    async fn sweep_display_registry(
        &self,
        endpoint_zones: &HashMap<DisplayEndpointId, ZoneId>,
        now: DateTime<Utc>,
    ) -> Result<Change<DisplaySweep>, RepositoryError> {
        let zones = self
            .store
            .load::<ZoneRegistry>()
            .await?
            .map_or_else(ZoneRegistry::fresh, |v| v.registry);
        let thresholds = self.config.thresholds;
        self.update(|registry: &mut DisplayRegistry| {
            sweep_displays(registry, &zones, endpoint_zones, now, &thresholds)
        })
        .await
    }
}

/// Run the eviction sweep every `interval` until the task is aborted.
pub fn spawn_sweeper<S, C, L>(
    service: Arc<SessionService<S, C, L>>,
    interval: Duration,
) -> JoinHandle<()>
where
    S: SessionStore + 'static,
    C: ConfigReader + 'static,
    L: AuditLedger + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = service.run_eviction_sweep(Utc::now()).await {
                error!(error = %e, "Scheduled eviction sweep failed");
            }
        }
    })
}
