//! Read-only catalog entities describing a venue.
//!
//! These mirror the configuration tables: zones group location devices and
//! display endpoints, display endpoints rotate notifications, and coupons hang
//! off notifications. The session engine never mutates them.

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    CouponId, DeviceIdentifier, DisplayEndpointId, LocationDeviceId, LocationDeviceKind, MimeType,
    NotificationId, ZoneId,
};

/// A timed promotional content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub name: String,
    pub sort_order: i32,
    /// How long one rotation slot showing this notification lasts, in seconds.
    pub timeout_secs: i32,
    pub active: bool,
    pub show_progress_bar: bool,
    pub content_mime_type: MimeType,
    pub content_subject: String,
    pub content_caption: String,
    pub content_body: String,
}

impl Notification {
    /// Rotation slot length. Negative timeouts count as zero.
    #[must_use]
    pub fn timeout(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.timeout_secs.max(0)))
    }
}

/// A discount offer tied to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub notification_id: NotificationId,
    pub name: String,
    pub code: String,
    pub description: String,
    pub discount_cents: Decimal,
}

/// A physical screen, with every notification configured against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEndpoint {
    pub id: DisplayEndpointId,
    pub zone_id: Option<ZoneId>,
    pub name: String,
    pub notifications: Vec<Notification>,
}

impl DisplayEndpoint {
    /// Notifications currently eligible for rotation, in catalog order.
    #[must_use]
    pub fn active_notifications(&self) -> Vec<&Notification> {
        self.notifications.iter().filter(|n| n.active).collect()
    }

    /// True when any notification (active or not) is configured.
    #[must_use]
    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }
}

/// A beacon whose proximity signals presence in a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDevice {
    pub id: LocationDeviceId,
    pub zone_id: Option<ZoneId>,
    pub kind: LocationDeviceKind,
    pub device_identifier: DeviceIdentifier,
    /// The single notification bound to this device, if any.
    pub bound_notification: Option<Notification>,
}

impl LocationDevice {
    /// The bound notification, only when it is marked active.
    #[must_use]
    pub fn active_bound_notification(&self) -> Option<&Notification> {
        self.bound_notification.as_ref().filter(|n| n.active)
    }
}

/// A named area grouping location devices and display endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub display_endpoints: Vec<DisplayEndpoint>,
}

impl Zone {
    #[must_use]
    pub fn display_endpoint_ids(&self) -> Vec<DisplayEndpointId> {
        self.display_endpoints.iter().map(|d| d.id).collect()
    }

    #[must_use]
    pub fn has_display_endpoints(&self) -> bool {
        !self.display_endpoints.is_empty()
    }
}
