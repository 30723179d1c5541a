//! A small in-memory venue shared by the service unit tests.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use proximity_core::{
    Coupon, CouponId, DeviceIdentifier, DisplayEndpoint, DisplayEndpointId, LocationDevice,
    LocationDeviceId, LocationDeviceKind, MimeType, Notification, NotificationId, UserId, Zone,
    ZoneId,
};

use super::SessionService;
use crate::config::SessionConfig;
use crate::db::{MemoryAuditLedger, MemoryCatalog, MemorySessionStore};

pub type TestService = SessionService<MemorySessionStore, MemoryCatalog, MemoryAuditLedger>;

pub const ZONE: ZoneId = ZoneId::new(1);
pub const EMPTY_ZONE: ZoneId = ZoneId::new(2);
pub const DISPLAY: DisplayEndpointId = DisplayEndpointId::new(1);
pub const BARE_DISPLAY: DisplayEndpointId = DisplayEndpointId::new(2);
pub const NOTIFICATION: i64 = 10;
pub const OTHER_NOTIFICATION: i64 = 11;
pub const BOUND_NOTIFICATION: i64 = 12;
pub const BEACON: &str = "beacon-entrance";
pub const BOUND_BEACON: &str = "BEACON-BOUND";
pub const ORPHAN_BEACON: &str = "beacon-orphan";
pub const AISLE_BEACON: &str = "beacon-aisle";
pub const BOUND_DEVICE: LocationDeviceId = LocationDeviceId::new(2);
pub const USER: UserId = UserId::new(1);
pub const OTHER_USER: UserId = UserId::new(2);

pub fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_700_000_000 + seconds)
}

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

fn coupon(id: i64, notification: i64) -> Coupon {
    Coupon {
        id: CouponId::new(id),
        notification_id: NotificationId::new(notification),
        name: format!("Coupon {id}"),
        code: format!("{id:011}"),
        description: "SAVE".to_string(),
        discount_cents: Decimal::new(199, 0),
    }
}

fn device(id: i64, identifier: &str, zone: Option<ZoneId>) -> LocationDevice {
    LocationDevice {
        id: LocationDeviceId::new(id),
        zone_id: zone,
        kind: LocationDeviceKind::IBeacon,
        device_identifier: DeviceIdentifier::parse(identifier).unwrap_or_else(|e| panic!("{e}")),
        bound_notification: None,
    }
}

/// Zone 1 holds one display with two active notifications; zone 2 holds a
/// display with nothing configured.
pub fn catalog() -> MemoryCatalog {
    let mut bound = device(2, BOUND_BEACON, Some(ZONE));
    bound.bound_notification = Some(notification(BOUND_NOTIFICATION, 15));

    MemoryCatalog::new()
        .with_zone(Zone {
            id: ZONE,
            name: "Entrance".to_string(),
            display_endpoints: vec![DisplayEndpoint {
                id: DISPLAY,
                zone_id: Some(ZONE),
                name: "Entrance screen".to_string(),
                notifications: vec![
                    notification(NOTIFICATION, 10),
                    notification(OTHER_NOTIFICATION, 20),
                ],
            }],
        })
        .with_zone(Zone {
            id: EMPTY_ZONE,
            name: "Aisle".to_string(),
            display_endpoints: vec![DisplayEndpoint {
                id: BARE_DISPLAY,
                zone_id: Some(EMPTY_ZONE),
                name: "Aisle screen".to_string(),
                notifications: Vec::new(),
            }],
        })
        .with_device(device(1, BEACON, Some(ZONE)))
        .with_device(bound)
        .with_device(device(3, ORPHAN_BEACON, None))
        .with_device(device(4, AISLE_BEACON, Some(EMPTY_ZONE)))
        .with_coupon(coupon(100, NOTIFICATION))
        .with_coupon(coupon(101, NOTIFICATION))
        .with_coupon(coupon(110, OTHER_NOTIFICATION))
        .with_user(USER)
        .with_user(OTHER_USER)
}

pub fn service() -> TestService {
    SessionService::new(
        MemorySessionStore::new(),
        catalog(),
        MemoryAuditLedger::new(),
        SessionConfig::default(),
    )
}
