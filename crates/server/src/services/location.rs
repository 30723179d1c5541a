//! Beacon sightings: user presence, display binding and coupon issuance.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use proximity_core::session::{
    Change, DisplayRegistry, ZoneRegistry, issue_coupons, touched_notification_ids,
};
use proximity_core::{
    Coupon, CouponId, DeviceIdentifier, DisplayEndpointId, LocationDevice, LocationDeviceKind,
    Notification, NotificationId, UserId, Zone, ZoneId,
};

use super::{ServiceError, SessionService};
use crate::db::{AuditLedger, ConfigReader, SessionStore};

/// A beacon reported in range (or reporting its own position).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub kind: LocationDeviceKind,
    pub device_identifier: String,
    pub at: DateTime<Utc>,
}

impl LocationReport {
    fn identifier(&self) -> Result<DeviceIdentifier, ServiceError> {
        if self.kind != LocationDeviceKind::IBeacon {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported location device type {}",
                self.kind
            )));
        }
        DeviceIdentifier::parse(&self.device_identifier)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))
    }
}

impl<S, C, L> SessionService<S, C, L>
where
    S: SessionStore,
    C: ConfigReader,
    L: AuditLedger,
{
    /// Record that `user` is near the reported beacon.
    ///
    /// Marks the zone's displays as occupied, applies the beacon's
    /// notification binding, refreshes the user's zone session and issues
    /// every coupon of a recently touched notification the user has not yet
    /// received during this visit.
    ///
    /// Returns the newly issued coupons. Coupons are only reported once both
    /// the zone registry and the audit ledger accepted them; any store
    /// failure yields an empty list. Coupons the ledger rejected are
    /// withdrawn from the user's session so a later sighting offers them
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a malformed user ID, device
    /// type or identifier, `ServiceError::NotFound` for an unknown user,
    /// device or zone and `ServiceError::Unavailable` if the catalog cannot
    /// be read.
    #[instrument(skip(self, report), fields(user_id = %user, device_identifier = %report.device_identifier))]
    pub async fn record_location(
        &self,
        user: UserId,
        report: LocationReport,
    ) -> Result<Vec<Coupon>, ServiceError> {
        if !user.is_valid() {
            return Err(ServiceError::InvalidInput(format!("invalid user id {user}")));
        }
        let identifier = report.identifier()?;

        let exists = self
            .catalog
            .user_exists(user)
            .await
            .map_err(ServiceError::Unavailable)?;
        if !exists {
            return Err(ServiceError::NotFound(format!("user {user}")));
        }

        let device = self.device(&identifier).await?;
        let Some(zone) = self.device_zone(&device).await? else {
            debug!("Device is not placed in a zone");
            return Ok(Vec::new());
        };

        let touched = self.mark_zone_displays(&zone, &device, report.at).await;

        let offered = match self.catalog.coupons_for_notifications(&touched).await {
            Ok(coupons) => coupons,
            Err(e) => {
                error!(error = %e, "Failed to read coupons, issuing none");
                Vec::new()
            }
        };

        let zone_id = zone.id;
        let issued = self
            .update(|registry: &mut ZoneRegistry| {
                let session = registry.record_presence(zone_id, user, report.at);
                Change::Modified(issue_coupons(session, &offered))
            })
            .await;

        let issued = match issued {
            Ok(change) => change.into_inner(),
            Err(e) => {
                error!(error = %e, key = "zone-registry", "Failed to record zone presence");
                return Ok(Vec::new());
            }
        };

        if issued.is_empty() {
            return Ok(issued);
        }

        let ids: Vec<CouponId> = issued.iter().map(|c| c.id).collect();
        if let Err(e) = self.ledger.append(user, &ids, report.at).await {
            error!(error = %e, coupons = ?ids, "Failed to append coupon ledger, withholding coupons");
            self.withdraw_coupons(zone_id, user, &ids).await;
            return Ok(Vec::new());
        }

        info!(count = issued.len(), "Coupons issued");
        Ok(issued)
    }

    /// Handle a moving beacon reporting its own position.
    ///
    /// Binds every display of the beacon's zone to it when the beacon
    /// carries an active notification, and returns that notification once
    /// the binding is stored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a malformed device type or
    /// identifier, `ServiceError::NotFound` for an unknown device or zone and
    /// `ServiceError::Unavailable` if the catalog cannot be read.
    #[instrument(skip(self, report), fields(device_identifier = %report.device_identifier))]
    pub async fn record_beacon_sighting(
        &self,
        report: LocationReport,
    ) -> Result<Option<Notification>, ServiceError> {
        let identifier = report.identifier()?;
        let device = self.device(&identifier).await?;

        let Some(zone) = self.device_zone(&device).await? else {
            debug!("Beacon is not placed in a zone");
            return Ok(None);
        };
        let Some(bound) = binding_for(&zone, &device) else {
            debug!("Beacon has nothing to bind");
            return Ok(None);
        };

        let endpoints = zone.display_endpoint_ids();
        let result = self
            .update(|registry: &mut DisplayRegistry| {
                registry.bind_device(endpoints.iter().copied(), device.id, report.at)
            })
            .await;

        match result {
            Ok(_) => {
                info!(notification_id = %bound.id, "Beacon bound to zone displays");
                Ok(Some(bound.clone()))
            }
            Err(e) => {
                error!(error = %e, key = "display-registry", "Failed to bind beacon");
                Ok(None)
            }
        }
    }

    /// Undo a zone-registry issuance the audit ledger did not accept.
    async fn withdraw_coupons(&self, zone: ZoneId, user: UserId, coupons: &[CouponId]) {
        let result = self
            .update(|registry: &mut ZoneRegistry| {
                Change::from_flag((), registry.withdraw_coupons(zone, user, coupons))
            })
            .await;
        if let Err(e) = result {
            error!(
                error = %e,
                key = "zone-registry",
                coupons = ?coupons,
                "Failed to withdraw unaudited coupons"
            );
        }
    }

    async fn device(&self, identifier: &DeviceIdentifier) -> Result<LocationDevice, ServiceError> {
        self.catalog
            .location_device(identifier)
            .await
            .map_err(ServiceError::Unavailable)?
            .ok_or_else(|| ServiceError::NotFound(format!("location device {identifier}")))
    }

    async fn device_zone(&self, device: &LocationDevice) -> Result<Option<Zone>, ServiceError> {
        let Some(zone_id) = device.zone_id else {
            return Ok(None);
        };
        self.catalog
            .zone(zone_id)
            .await
            .map_err(ServiceError::Unavailable)?
            .ok_or_else(|| ServiceError::NotFound(format!("zone {zone_id}")))
            .map(Some)
    }

    /// Raise presence on the zone's displays, apply the beacon binding, and
    /// return the notifications last touched on those displays.
    ///
    /// A store failure is logged and yields no touched notifications.
    async fn mark_zone_displays(
        &self,
        zone: &Zone,
        device: &LocationDevice,
        at: DateTime<Utc>,
    ) -> Vec<NotificationId> {
        let endpoints = zone.display_endpoint_ids();
        let with_content: Vec<DisplayEndpointId> = zone
            .display_endpoints
            .iter()
            .filter(|e| e.has_notifications())
            .map(|e| e.id)
            .collect();
        let binds = binding_for(zone, device).is_some();

        let result = self
            .update(|registry: &mut DisplayRegistry| {
                let presence = registry.mark_user_present(with_content.iter().copied());
                let bound = if binds {
                    registry.bind_device(endpoints.iter().copied(), device.id, at)
                } else {
                    Change::Unchanged(())
                };
                let touched = touched_notification_ids(registry, &endpoints);
                Change::from_flag(touched, presence.is_modified() || bound.is_modified())
            })
            .await;

        match result {
            Ok(change) => change.into_inner(),
            Err(e) => {
                warn!(error = %e, key = "display-registry", "Failed to mark zone displays");
                Vec::new()
            }
        }
    }
}

/// The notification a beacon binds to its zone's displays, if any.
fn binding_for<'a>(zone: &Zone, device: &'a LocationDevice) -> Option<&'a Notification> {
    if !zone.has_display_endpoints() {
        return None;
    }
    device.active_bound_notification()
}
