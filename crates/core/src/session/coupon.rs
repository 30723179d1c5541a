//! Joining touch history to a user's unclaimed coupons.

use super::{DisplayRegistry, UserSession};
use crate::types::{Coupon, DisplayEndpointId, NotificationId};

/// Notifications last touched on any of `endpoints`, without duplicates.
#[must_use]
pub fn touched_notification_ids(
    registry: &DisplayRegistry,
    endpoints: &[DisplayEndpointId],
) -> Vec<NotificationId> {
    let mut touched = Vec::new();
    for endpoint in endpoints {
        if let Some(id) = registry
            .session(*endpoint)
            .and_then(|s| s.touched_notification_id)
            && !touched.contains(&id)
        {
            touched.push(id);
        }
    }
    touched
}

/// Issue every offered coupon the user has not yet received during this visit.
///
/// The issued coupons are appended to the user's ledger and returned in offer
/// order. Offering the same coupon twice issues it at most once.
pub fn issue_coupons(session: &mut UserSession, offered: &[Coupon]) -> Vec<Coupon> {
    offered
        .iter()
        .filter(|coupon| session.record_received(coupon.id))
        .cloned()
        .collect()
}
