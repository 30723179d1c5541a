//! Per-display-endpoint rotation, touch and beacon-binding state.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rotation::pick_notification;
use super::{Change, Registry};
use crate::types::{DisplayEndpointId, LocationDeviceId, Notification, NotificationId};

/// All display sessions of the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRegistry {
    pub id: Uuid,
    #[serde(default)]
    pub sessions: BTreeMap<DisplayEndpointId, DisplaySession>,
    pub last_flushed_at: Option<DateTime<Utc>>,
}

impl Registry for DisplayRegistry {
    const KEY: &'static str = "display-registry";

    fn fresh() -> Self {
        Self {
            id: Uuid::new_v4(),
            sessions: BTreeMap::new(),
            last_flushed_at: None,
        }
    }
}

/// Rotation and interaction state of one display endpoint.
///
/// Created lazily on first write, never deleted. The eviction sweep only
/// resets fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySession {
    /// True while at least one user is present in the endpoint's zone.
    pub user_present: bool,
    /// Notification slated for the next rotation slot.
    pub buffered_notification_id: Option<NotificationId>,
    /// When the current rotation slot expires.
    pub slot_expires_at: Option<DateTime<Utc>>,
    pub touched_notification_id: Option<NotificationId>,
    pub touched_at: Option<DateTime<Utc>>,
    /// Beacon whose bound notification overrides rotation.
    pub bound_device_id: Option<LocationDeviceId>,
    pub bound_at: Option<DateTime<Utc>>,
}

/// What a display should show after a rotation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// A beacon binding overrides rotation; show that device's bound
    /// notification if it is active.
    Bound(LocationDeviceId),
    Show(Notification),
    Nothing,
}

impl DisplayRegistry {
    #[must_use]
    pub fn session(&self, endpoint: DisplayEndpointId) -> Option<&DisplaySession> {
        self.sessions.get(&endpoint)
    }

    /// Find or create the session of an endpoint.
    pub fn obtain(&mut self, endpoint: DisplayEndpointId) -> &mut DisplaySession {
        self.sessions.entry(endpoint).or_default()
    }

    /// Raise the user-presence flag on the given endpoints.
    ///
    /// Reports a change only when at least one flag actually flipped.
    pub fn mark_user_present(
        &mut self,
        endpoints: impl IntoIterator<Item = DisplayEndpointId>,
    ) -> Change<()> {
        let mut modified = false;
        for endpoint in endpoints {
            let session = self.obtain(endpoint);
            if !session.user_present {
                session.user_present = true;
                modified = true;
            }
        }
        Change::from_flag((), modified)
    }

    /// Bind every given endpoint to a location device.
    pub fn bind_device(
        &mut self,
        endpoints: impl IntoIterator<Item = DisplayEndpointId>,
        device: LocationDeviceId,
        at: DateTime<Utc>,
    ) -> Change<()> {
        let mut modified = false;
        for endpoint in endpoints {
            let session = self.obtain(endpoint);
            session.bound_device_id = Some(device);
            session.bound_at = Some(at);
            modified = true;
        }
        Change::from_flag((), modified)
    }
}

impl DisplaySession {
    /// Record a touch on `notification` and force the rotation to refresh on
    /// the next fetch.
    pub fn touch(&mut self, notification: NotificationId, at: DateTime<Utc>) {
        self.touched_notification_id = Some(notification);
        self.touched_at = Some(at);
        self.slot_expires_at = Some(at);
        self.buffered_notification_id = None;
    }

    /// Advance the rotation and decide what to show.
    ///
    /// `active` holds the endpoint's active notifications. Priority order:
    /// a beacon binding wins outright, then rotation runs while a user is
    /// present, otherwise nothing is shown.
    ///
    /// While the slot has not expired this returns the *buffered* notification,
    /// i.e. the one prepared for the next slot, not the one returned when the
    /// slot was opened.
    pub fn rotate<R>(
        &mut self,
        active: &[Notification],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Change<RotationOutcome>
    where
        R: Rng + ?Sized,
    {
        if let Some(device) = self.bound_device_id {
            return Change::Unchanged(RotationOutcome::Bound(device));
        }
        if !self.user_present || active.is_empty() {
            return Change::Unchanged(RotationOutcome::Nothing);
        }

        let Some(buffered) = self.buffered_notification_id else {
            return self.open_slot(active, now, rng);
        };

        match self.slot_expires_at {
            Some(expires_at) if now <= expires_at => {
                let outcome = active
                    .iter()
                    .find(|n| n.id == buffered)
                    .map_or(RotationOutcome::Nothing, |n| {
                        RotationOutcome::Show(n.clone())
                    });
                Change::Unchanged(outcome)
            }
            expires_at => {
                let expiring = active.iter().find(|n| n.id == buffered);
                let Some(shown) = pick_notification(active, Some(buffered), rng) else {
                    return Change::Unchanged(RotationOutcome::Nothing);
                };
                let slot = expiring.map_or_else(TimeDelta::zero, Notification::timeout);
                self.buffered_notification_id = Some(shown.id);
                self.slot_expires_at = Some(expires_at.unwrap_or(now) + slot);
                Change::Modified(RotationOutcome::Show(shown.clone()))
            }
        }
    }

    /// First fetch after the buffer was cleared: show one notification and
    /// buffer a different one for the next slot.
    fn open_slot<R>(
        &mut self,
        active: &[Notification],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Change<RotationOutcome>
    where
        R: Rng + ?Sized,
    {
        let Some(shown) = pick_notification(active, None, rng) else {
            return Change::Unchanged(RotationOutcome::Nothing);
        };
        self.buffered_notification_id =
            pick_notification(active, Some(shown.id), rng).map(|n| n.id);
        self.slot_expires_at = Some(now + shown.timeout());
        Change::Modified(RotationOutcome::Show(shown.clone()))
    }
}
