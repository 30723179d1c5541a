//! Deciding what a display endpoint shows next.

use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument};

use proximity_core::session::{Change, DisplayRegistry, RotationOutcome};
use proximity_core::{DisplayEndpointId, Notification};

use super::{ServiceError, SessionService};
use crate::db::{AuditLedger, ConfigReader, SessionStore};

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    /// Advance the rotation of `endpoint` and return what it should show.
    ///
    /// A beacon binding wins over rotation and yields the bound device's
    /// notification while it is active. Rotation only runs while a user is
    /// present in the endpoint's zone. A store failure, or a bound device
    /// that cannot be read once the rotation step ran, yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a malformed endpoint ID,
    /// `ServiceError::NotFound` for an unknown endpoint and
    /// `ServiceError::Unavailable` if the catalog cannot be read.
    #[instrument(skip(self), fields(display_endpoint_id = %endpoint))]
    pub async fn fetch_notification(
        &self,
        endpoint: DisplayEndpointId,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, ServiceError> {
        if !endpoint.is_valid() {
            return Err(ServiceError::InvalidInput(format!(
                "invalid display endpoint id {endpoint}"
            )));
        }

        let display = self
            .catalog
            .display_endpoint(endpoint)
            .await
            .map_err(ServiceError::Unavailable)?
            .ok_or_else(|| ServiceError::NotFound(format!("display endpoint {endpoint}")))?;
        let active: Vec<Notification> = display.active_notifications().into_iter().cloned().collect();

        let rotated = self
            .update(|registry: &mut DisplayRegistry| match registry.sessions.get_mut(&endpoint) {
                Some(session) => session.rotate(&active, now, &mut rand::rng()),
                None => Change::Unchanged(RotationOutcome::Nothing),
            })
            .await;

        let outcome = match rotated {
            Ok(change) => change.into_inner(),
            Err(e) => {
                error!(error = %e, key = "display-registry", "Failed to rotate display");
                return Ok(None);
            }
        };

        match outcome {
            RotationOutcome::Show(notification) => {
                debug!(notification_id = %notification.id, "Showing rotated notification");
                Ok(Some(notification))
            }
            RotationOutcome::Bound(device) => {
                let bound = match self.catalog.location_device_by_id(device).await {
                    Ok(found) => found.and_then(|d| d.active_bound_notification().cloned()),
                    Err(e) => {
                        error!(
                            error = %e,
                            location_device_id = %device,
                            "Failed to read bound device, showing nothing"
                        );
                        return Ok(None);
                    }
                };
                debug!(bound = bound.is_some(), "Display bound to beacon");
                Ok(bound)
            }
            RotationOutcome::Nothing => Ok(None),
        }
    }
}
