//! Fixtures shared by the unit tests of this crate.

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::{
    Coupon, CouponId, DisplayEndpoint, DisplayEndpointId, MimeType, Notification, NotificationId,
    ZoneId,
};

/// A fixed instant `seconds` after the test epoch.
pub fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_700_000_000 + seconds)
}

/// An active notification with the given timeout.
pub fn notification(id: i64, timeout_secs: i32) -> Notification {
    Notification {
        id: NotificationId::new(id),
        name: format!("Notification {id}"),
        sort_order: 0,
        timeout_secs,
        active: true,
        show_progress_bar: false,
        content_mime_type: MimeType::ImagePng,
        content_subject: format!("Subject {id}"),
        content_caption: String::new(),
        content_body: String::new(),
    }
}

pub fn endpoint(id: i64, zone: i64, notifications: Vec<Notification>) -> DisplayEndpoint {
    DisplayEndpoint {
        id: DisplayEndpointId::new(id),
        zone_id: Some(ZoneId::new(zone)),
        name: format!("Display {id}"),
        notifications,
    }
}

pub fn coupon(id: i64, notification: i64) -> Coupon {
    Coupon {
        id: CouponId::new(id),
        notification_id: NotificationId::new(notification),
        name: format!("Coupon {id}"),
        code: format!("{id:011}"),
        description: "SAVE".to_string(),
        discount_cents: rust_decimal::Decimal::new(199, 0),
    }
}
