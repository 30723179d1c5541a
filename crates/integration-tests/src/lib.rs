//! End-to-end session scenarios for Proximity.
//!
//! Tests drive the business operations of `proximity-server` against the
//! in-memory catalog, session store and ledger, so they run without a
//! database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p proximity-integration-tests
//! ```
//!
//! # Venue
//!
//! ```text
//! zone 1 "Entrance"  display 1: notification 10 (10s)          beacon "entrance"
//! zone 2 "Bakery"    display 2: notifications 20, 21, 22 (10s)  beacon "bakery"
//! zone 3 "Aisle"     display 3: nothing configured              beacons "tablets" (bound to 30),
//!                                                                       "retired" (bound to inactive 31)
//! coupons: 100 -> 10, 200 and 201 -> 20, 210 -> 21
//! users:   1..=64
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use proximity_core::{
    Coupon, CouponId, DeviceIdentifier, DisplayEndpoint, DisplayEndpointId, EventKind,
    EventSourceKind, LocationDevice, LocationDeviceId, LocationDeviceKind, MimeType, Notification,
    NotificationId, UserId, Zone, ZoneId,
};
use proximity_server::config::SessionConfig;
use proximity_server::db::{MemoryAuditLedger, MemoryCatalog, MemorySessionStore};
use proximity_server::services::{LocationReport, SessionService, TouchEvent};

/// Session service over the in-memory stores.
pub type Service = SessionService<MemorySessionStore, MemoryCatalog, MemoryAuditLedger>;

pub const ENTRANCE: ZoneId = ZoneId::new(1);
pub const BAKERY: ZoneId = ZoneId::new(2);
pub const AISLE: ZoneId = ZoneId::new(3);

pub const ENTRANCE_DISPLAY: DisplayEndpointId = DisplayEndpointId::new(1);
pub const BAKERY_DISPLAY: DisplayEndpointId = DisplayEndpointId::new(2);
pub const AISLE_DISPLAY: DisplayEndpointId = DisplayEndpointId::new(3);

pub const WELCOME: NotificationId = NotificationId::new(10);
pub const DOUGHNUT: NotificationId = NotificationId::new(20);
pub const CROISSANT: NotificationId = NotificationId::new(21);
pub const COLA: NotificationId = NotificationId::new(22);
pub const TABLETS: NotificationId = NotificationId::new(30);
pub const RETIRED: NotificationId = NotificationId::new(31);

pub const ENTRANCE_BEACON: &str = "entrance";
pub const BAKERY_BEACON: &str = "bakery";
pub const TABLETS_BEACON: &str = "tablets";
pub const RETIRED_BEACON: &str = "retired";

/// Number of users known to the catalog.
pub const USERS: i64 = 64;

/// Seconds after a fixed epoch.
#[must_use]
pub fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_750_000_000 + seconds)
}

#[must_use]
pub const fn user(id: i64) -> UserId {
    UserId::new(id)
}

#[must_use]
pub fn notification(id: NotificationId, timeout_secs: i32) -> Notification {
    Notification {
        id,
        name: format!("Notification {id}"),
        sort_order: 0,
        timeout_secs,
        active: true,
        show_progress_bar: true,
        content_mime_type: MimeType::ImageJpg,
        content_subject: format!("Advertisement {id}"),
        content_caption: String::new(),
        content_body: format!("https://example.com/{id}.jpg"),
    }
}

fn coupon(id: i64, notification: NotificationId, cents: i64) -> Coupon {
    Coupon {
        id: CouponId::new(id),
        notification_id: notification,
        name: format!("Coupon {id}"),
        code: format!("{id:011}"),
        description: format!("SAVE {cents} cents"),
        discount_cents: Decimal::from(cents),
    }
}

fn beacon(
    id: i64,
    identifier: &str,
    zone: ZoneId,
    bound: Option<Notification>,
) -> LocationDevice {
    LocationDevice {
        id: LocationDeviceId::new(id),
        zone_id: Some(zone),
        kind: LocationDeviceKind::IBeacon,
        device_identifier: DeviceIdentifier::parse(identifier)
            .unwrap_or_else(|e| panic!("fixture identifier {identifier}: {e}")),
        bound_notification: bound,
    }
}

fn display(
    id: DisplayEndpointId,
    zone: ZoneId,
    notifications: Vec<Notification>,
) -> DisplayEndpoint {
    DisplayEndpoint {
        id,
        zone_id: Some(zone),
        name: format!("Display {id}"),
        notifications,
    }
}

/// The venue described in the crate docs.
#[must_use]
pub fn venue() -> MemoryCatalog {
    let mut retired = notification(RETIRED, 10);
    retired.active = false;

    let mut catalog = MemoryCatalog::new()
        .with_zone(Zone {
            id: ENTRANCE,
            name: "Entrance".to_string(),
            display_endpoints: vec![display(
                ENTRANCE_DISPLAY,
                ENTRANCE,
                vec![notification(WELCOME, 10)],
            )],
        })
        .with_zone(Zone {
            id: BAKERY,
            name: "Bakery".to_string(),
            display_endpoints: vec![display(
                BAKERY_DISPLAY,
                BAKERY,
                vec![
                    notification(DOUGHNUT, 10),
                    notification(CROISSANT, 10),
                    notification(COLA, 10),
                ],
            )],
        })
        .with_zone(Zone {
            id: AISLE,
            name: "Aisle".to_string(),
            display_endpoints: vec![display(AISLE_DISPLAY, AISLE, Vec::new())],
        })
        .with_device(beacon(1, ENTRANCE_BEACON, ENTRANCE, None))
        .with_device(beacon(2, BAKERY_BEACON, BAKERY, None))
        .with_device(beacon(3, TABLETS_BEACON, AISLE, Some(notification(TABLETS, 15))))
        .with_device(beacon(4, RETIRED_BEACON, AISLE, Some(retired)))
        .with_coupon(coupon(100, WELCOME, 0))
        .with_coupon(coupon(200, DOUGHNUT, 199))
        .with_coupon(coupon(201, DOUGHNUT, 49))
        .with_coupon(coupon(210, CROISSANT, 20));

    for id in 1..=USERS {
        catalog = catalog.with_user(user(id));
    }
    catalog
}

/// A service over a fresh venue with default thresholds.
#[must_use]
pub fn service() -> Service {
    service_with(SessionConfig::default())
}

#[must_use]
pub fn service_with(config: SessionConfig) -> Service {
    SessionService::new(
        MemorySessionStore::new(),
        venue(),
        MemoryAuditLedger::new(),
        config,
    )
}

/// A phone reporting that it sees `beacon` at `seconds`.
#[must_use]
pub fn sighting(beacon: &str, seconds: i64) -> LocationReport {
    LocationReport {
        kind: LocationDeviceKind::IBeacon,
        device_identifier: beacon.to_string(),
        at: at(seconds),
    }
}

/// A touch on `notification` at `seconds`.
#[must_use]
pub fn touch(notification: NotificationId, seconds: i64) -> TouchEvent {
    TouchEvent {
        kind: EventKind::DisplayEndpointTouch,
        source_kind: EventSourceKind::Notification,
        source_id: notification,
        at: at(seconds),
    }
}
