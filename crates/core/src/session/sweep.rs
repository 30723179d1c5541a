//! TTL-based eviction of idle sessions.
//!
//! Run the zone pass first, then feed the resulting zone registry to the
//! display pass so presence flags reflect the users that survived.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use super::{Change, DisplayRegistry, ZoneRegistry};
use crate::types::{DisplayEndpointId, ZoneId};

/// How long each kind of state may sit idle before the sweep resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleThresholds {
    /// Since a user was last seen in a zone.
    pub zone: TimeDelta,
    /// Since a display was last touched.
    pub touch: TimeDelta,
    /// Since a beacon was bound to a display.
    pub binding: TimeDelta,
}

impl Default for IdleThresholds {
    fn default() -> Self {
        Self {
            zone: TimeDelta::seconds(300),
            touch: TimeDelta::seconds(60),
            binding: TimeDelta::seconds(60),
        }
    }
}

/// Counts of display sessions reset by one display pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySweep {
    pub presence_cleared: usize,
    pub touches_cleared: usize,
    pub bindings_cleared: usize,
}

impl DisplaySweep {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.presence_cleared + self.touches_cleared + self.bindings_cleared
    }
}

/// `true` when `stamp` is absent or strictly older than `threshold` at `now`.
fn is_idle(stamp: Option<DateTime<Utc>>, threshold: TimeDelta, now: DateTime<Utc>) -> bool {
    stamp.is_none_or(|at| at + threshold < now)
}

/// Delete user sessions idle past the zone threshold.
///
/// Zone sessions themselves are kept even when emptied. Returns the number of
/// user sessions deleted; `last_flushed_at` is stamped only on a change.
pub fn sweep_zones(
    registry: &mut ZoneRegistry,
    now: DateTime<Utc>,
    thresholds: &IdleThresholds,
) -> Change<usize> {
    let mut evicted = 0;
    for zone in registry.sessions.values_mut() {
        let before = zone.users.len();
        zone.users
            .retain(|_, user| !is_idle(user.last_seen_at, thresholds.zone, now));
        let removed = before - zone.users.len();
        if removed > 0 {
            zone.last_flushed_at = Some(now);
            evicted += removed;
        }
    }

    if evicted > 0 {
        registry.last_flushed_at = Some(now);
    }
    Change::from_flag(evicted, evicted > 0)
}

/// Reset presence, touch and binding state on display sessions.
///
/// `endpoint_zones` maps each display endpoint to its zone. An endpoint
/// missing from the map counts as a zone with no users.
pub fn sweep_displays(
    registry: &mut DisplayRegistry,
    zones: &ZoneRegistry,
    endpoint_zones: &HashMap<DisplayEndpointId, ZoneId>,
    now: DateTime<Utc>,
    thresholds: &IdleThresholds,
) -> Change<DisplaySweep> {
    let mut sweep = DisplaySweep::default();

    for (endpoint, session) in &mut registry.sessions {
        let occupied = endpoint_zones
            .get(endpoint)
            .is_some_and(|zone| zones.is_occupied(*zone));

        if session.user_present && !occupied {
            session.user_present = false;
            session.buffered_notification_id = None;
            if session.slot_expires_at.is_some_and(|at| at < now) {
                session.slot_expires_at = None;
            }
            sweep.presence_cleared += 1;
        }

        if session.touched_notification_id.is_some()
            && is_idle(session.touched_at, thresholds.touch, now)
        {
            session.touched_notification_id = None;
            session.touched_at = None;
            sweep.touches_cleared += 1;
        }

        if session.bound_device_id.is_some()
            && is_idle(session.bound_at, thresholds.binding, now)
        {
            session.bound_device_id = None;
            session.bound_at = None;
            sweep.bindings_cleared += 1;
        }
    }

    let modified = sweep.total() > 0;
    if modified {
        registry.last_flushed_at = Some(now);
    }
    Change::from_flag(sweep, modified)
}
