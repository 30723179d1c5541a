//! Touch events reported by display endpoints.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use proximity_core::session::{Change, DisplayRegistry};
use proximity_core::{DisplayEndpointId, EventKind, EventSourceKind, NotificationId};

use super::{ServiceError, SessionService};
use crate::db::{AuditLedger, ConfigReader, SessionStore};

/// A user touching a notification on a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub kind: EventKind,
    pub source_kind: EventSourceKind,
    /// The touched notification.
    pub source_id: NotificationId,
    pub at: DateTime<Utc>,
}

impl TouchEvent {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.kind != EventKind::DisplayEndpointTouch {
            return Err(ServiceError::InvalidInput(
                "event type must be display_endpoint_touch".to_string(),
            ));
        }
        if self.source_kind != EventSourceKind::Notification {
            return Err(ServiceError::InvalidInput(
                "event source type must be notification".to_string(),
            ));
        }
        if !self.source_id.is_valid() {
            return Err(ServiceError::InvalidInput(format!(
                "invalid source id {}",
                self.source_id
            )));
        }
        Ok(())
    }
}

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    /// Record a touch on `endpoint` and force its rotation to refresh.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a malformed endpoint ID or
    /// event, `ServiceError::NotFound` for an unknown endpoint and
    /// `ServiceError::Unavailable` if the catalog cannot be read.
    #[instrument(skip(self, event), fields(display_endpoint_id = %endpoint, notification_id = %event.source_id))]
    pub async fn record_touch(
        &self,
        endpoint: DisplayEndpointId,
        event: TouchEvent,
    ) -> Result<(), ServiceError> {
        if !endpoint.is_valid() {
            return Err(ServiceError::InvalidInput(format!(
                "invalid display endpoint id {endpoint}"
            )));
        }
        event.validate()?;

        self.catalog
            .display_endpoint(endpoint)
            .await
            .map_err(ServiceError::Unavailable)?
            .ok_or_else(|| ServiceError::NotFound(format!("display endpoint {endpoint}")))?;

        let result = self
            .update(|registry: &mut DisplayRegistry| {
                registry.obtain(endpoint).touch(event.source_id, event.at);
                Change::Modified(())
            })
            .await;

        match result {
            Ok(_) => info!("Touch recorded"),
            Err(e) => error!(error = %e, key = "display-registry", "Failed to record touch"),
        }
        Ok(())
    }
}
