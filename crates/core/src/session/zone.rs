//! Per-zone, per-user presence tracking and coupon ledgers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Registry;
use crate::types::{CouponId, UserId, ZoneId};

/// All zone sessions of the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRegistry {
    pub id: Uuid,
    #[serde(default)]
    pub sessions: BTreeMap<ZoneId, ZoneSession>,
    pub last_flushed_at: Option<DateTime<Utc>>,
}

impl Registry for ZoneRegistry {
    const KEY: &'static str = "zone-registry";

    fn fresh() -> Self {
        Self {
            id: Uuid::new_v4(),
            sessions: BTreeMap::new(),
            last_flushed_at: None,
        }
    }
}

/// Users currently seen in one zone.
///
/// Never removed from the registry, even once its last user is evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSession {
    #[serde(default)]
    pub users: BTreeMap<UserId, UserSession>,
    pub last_flushed_at: Option<DateTime<Utc>>,
}

/// One user's visit to one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// First sighting; never moved afterwards.
    pub entered_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Coupons already issued during this visit, in issue order, no duplicates.
    #[serde(default)]
    pub received_coupon_ids: Vec<CouponId>,
}

impl UserSession {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self {
            entered_at: at,
            last_seen_at: Some(at),
            received_coupon_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_received(&self, coupon: CouponId) -> bool {
        self.received_coupon_ids.contains(&coupon)
    }

    /// Append to the ledger. Returns false when the coupon was already there.
    pub fn record_received(&mut self, coupon: CouponId) -> bool {
        if self.has_received(coupon) {
            return false;
        }
        self.received_coupon_ids.push(coupon);
        true
    }
}

impl ZoneRegistry {
    #[must_use]
    pub fn session(&self, zone: ZoneId) -> Option<&ZoneSession> {
        self.sessions.get(&zone)
    }

    #[must_use]
    pub fn user_session(&self, zone: ZoneId, user: UserId) -> Option<&UserSession> {
        self.sessions.get(&zone).and_then(|z| z.users.get(&user))
    }

    /// True when the zone currently holds at least one user session.
    #[must_use]
    pub fn is_occupied(&self, zone: ZoneId) -> bool {
        self.sessions.get(&zone).is_some_and(|z| !z.users.is_empty())
    }

    /// Record a sighting of `user` in `zone`.
    ///
    /// A first sighting creates the session with both timestamps set to `at`
    /// and an empty ledger; later sightings only move `last_seen_at`.
    pub fn record_presence(
        &mut self,
        zone: ZoneId,
        user: UserId,
        at: DateTime<Utc>,
    ) -> &mut UserSession {
        let session = self
            .sessions
            .entry(zone)
            .or_default()
            .users
            .entry(user)
            .or_insert_with(|| UserSession::new(at));
        session.last_seen_at = Some(at);
        session
    }

    /// Drop `coupons` from the user's ledger so they are offered again.
    ///
    /// Returns false when the user has no session in `zone` or held none of
    /// the coupons.
    pub fn withdraw_coupons(&mut self, zone: ZoneId, user: UserId, coupons: &[CouponId]) -> bool {
        let Some(session) = self
            .sessions
            .get_mut(&zone)
            .and_then(|z| z.users.get_mut(&user))
        else {
            return false;
        };
        let before = session.received_coupon_ids.len();
        session.received_coupon_ids.retain(|id| !coupons.contains(id));
        session.received_coupon_ids.len() != before
    }
}
