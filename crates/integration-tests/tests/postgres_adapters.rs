//! `PostgreSQL` adapters against a live database.
//!
//! These tests require:
//! - A running, disposable `PostgreSQL` database
//! - `PROXIMITY_TEST_DATABASE_URL` pointing at it
//!
//! The session-store test overwrites the live zone registry, so never point
//! it at a database that serves traffic. Migrations are applied on connect.
//!
//! Run with: cargo test -p proximity-integration-tests -- --ignored

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use proximity_core::session::{Registry, ZoneRegistry};
use proximity_core::{
    CouponId, DeviceIdentifier, DisplayEndpointId, LocationDeviceId, NotificationId, UserId,
    ZoneId,
};
use proximity_server::db::{
    AuditLedger, ConfigReader, PgAuditLedger, PgCatalog, PgSessionStore, RepositoryError,
    SessionStore,
};

async fn test_pool() -> PgPool {
    let url = std::env::var("PROXIMITY_TEST_DATABASE_URL")
        .expect("PROXIMITY_TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Rows created for one test, each with fresh IDs.
struct Venue {
    zone: ZoneId,
    display: DisplayEndpointId,
    notification: NotificationId,
    coupons: [CouponId; 2],
    device: LocationDeviceId,
    identifier: String,
    user: UserId,
}

async fn insert_id(pool: &PgPool, sql: &str, binds: &[i64], text: &str) -> i64 {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for bind in binds {
        query = query.bind(*bind);
    }
    if !text.is_empty() {
        query = query.bind(text.to_string());
    }
    query.fetch_one(pool).await.expect("Failed to insert fixture row")
}

async fn create_venue(pool: &PgPool) -> Venue {
    let tag = Uuid::new_v4().simple().to_string();

    let client = insert_id(
        pool,
        "INSERT INTO proximity.client (name) VALUES ($1) RETURNING id",
        &[],
        &tag,
    )
    .await;
    let spot = insert_id(
        pool,
        "INSERT INTO proximity.client_spot (client_id, name) VALUES ($1, $2) RETURNING id",
        &[client],
        "Test Spot",
    )
    .await;
    let zone = insert_id(
        pool,
        "INSERT INTO proximity.zone (client_spot_id, name) VALUES ($1, $2) RETURNING id",
        &[spot],
        "Test Zone",
    )
    .await;
    let notification = insert_id(
        pool,
        "INSERT INTO proximity.notification (client_id, name, timeout_secs) VALUES ($1, $2, 15) RETURNING id",
        &[client],
        "Test Notification",
    )
    .await;
    let display = insert_id(
        pool,
        "INSERT INTO proximity.display_endpoint (zone_id, name) VALUES ($1, $2) RETURNING id",
        &[zone],
        "Test Display",
    )
    .await;
    sqlx::query(
        "INSERT INTO proximity.display_endpoint_notification (display_endpoint_id, notification_id)
         VALUES ($1, $2)",
    )
    .bind(display)
    .bind(notification)
    .execute(pool)
    .await
    .expect("Failed to link display");

    let mut coupons = [CouponId::new(0); 2];
    for (slot, cents) in coupons.iter_mut().zip([199_i64, 49]) {
        *slot = CouponId::new(
            insert_id(
                pool,
                "INSERT INTO proximity.coupon (notification_id, discount_cents, name, code)
                 VALUES ($1, $2, $3, '00000000000') RETURNING id",
                &[notification, cents],
                "Test Coupon",
            )
            .await,
        );
    }

    let identifier = format!("Beacon-{tag}");
    let device = insert_id(
        pool,
        "INSERT INTO proximity.location_device (zone_id, notification_id, device_identifier)
         VALUES ($1, $2, $3) RETURNING id",
        &[zone, notification],
        &identifier,
    )
    .await;
    let user = insert_id(
        pool,
        "INSERT INTO proximity.user (name) VALUES ($1) RETURNING id",
        &[],
        &tag,
    )
    .await;

    Venue {
        zone: ZoneId::new(zone),
        display: DisplayEndpointId::new(display),
        notification: NotificationId::new(notification),
        coupons,
        device: LocationDeviceId::new(device),
        identifier,
        user: UserId::new(user),
    }
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_session_store_rejects_stale_and_duplicate_writes() {
    let pool = test_pool().await;
    sqlx::query("DELETE FROM proximity.session_registry WHERE key = $1")
        .bind(ZoneRegistry::KEY)
        .execute(&pool)
        .await
        .expect("Failed to clear registry");
    let store = PgSessionStore::new(pool);

    assert!(store.load::<ZoneRegistry>().await.expect("load").is_none());
    let created = store
        .save(&ZoneRegistry::fresh(), None)
        .await
        .expect("Failed to create registry");
    assert_eq!(created, 1);

    let duplicate = store.save(&ZoneRegistry::fresh(), None).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let first = store.load::<ZoneRegistry>().await.expect("load").expect("stored");
    let second = store.load::<ZoneRegistry>().await.expect("load").expect("stored");

    let mut updated = first.registry.clone();
    updated.record_presence(ZoneId::new(1), UserId::new(1), Utc::now());
    let version = store
        .save(&updated, Some(first.version))
        .await
        .expect("Failed to update registry");
    assert_eq!(version, 2);

    let stale = store.save(&second.registry, Some(second.version)).await;
    assert!(matches!(stale, Err(RepositoryError::Conflict(_))));

    let stored = store.load::<ZoneRegistry>().await.expect("load").expect("stored");
    assert_eq!(stored.version, 2);
    assert_eq!(stored.registry, updated);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_ledger_append_is_recorded_in_order() {
    let pool = test_pool().await;
    let venue = create_venue(&pool).await;
    let ledger = PgAuditLedger::new(pool.clone());
    let issued_at: DateTime<Utc> = "2026-10-18T12:00:00Z".parse().expect("timestamp");

    ledger
        .append(venue.user, &[], issued_at)
        .await
        .expect("Empty append failed");
    let [first, second] = venue.coupons;
    ledger
        .append(venue.user, &[second, first], issued_at)
        .await
        .expect("Failed to append ledger");

    let rows: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
        "SELECT coupon_id, issued_at FROM proximity.user_coupon WHERE user_id = $1 ORDER BY id",
    )
    .bind(venue.user.as_i64())
    .fetch_all(&pool)
    .await
    .expect("Failed to read ledger");

    assert_eq!(
        rows,
        vec![(second.as_i64(), issued_at), (first.as_i64(), issued_at)]
    );
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_ledger_append_is_all_or_nothing() {
    let pool = test_pool().await;
    let venue = create_venue(&pool).await;
    let ledger = PgAuditLedger::new(pool.clone());

    let [first, _] = venue.coupons;
    let result = ledger
        .append(venue.user, &[first, CouponId::new(i64::MAX)], Utc::now())
        .await;
    assert!(matches!(result, Err(RepositoryError::Database(_))));

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM proximity.user_coupon WHERE user_id = $1")
            .bind(venue.user.as_i64())
            .fetch_one(&pool)
            .await
            .expect("Failed to count ledger");
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_device_lookup_ignores_case() {
    let pool = test_pool().await;
    let venue = create_venue(&pool).await;
    let catalog = PgCatalog::new(pool, Duration::from_secs(60));

    let shouted = DeviceIdentifier::parse(&venue.identifier.to_uppercase()).expect("identifier");
    let device = catalog
        .location_device(&shouted)
        .await
        .expect("Failed to look up device")
        .expect("device exists");

    assert_eq!(device.id, venue.device);
    assert_eq!(device.zone_id, Some(venue.zone));
    let bound = device.active_bound_notification().expect("bound notification");
    assert_eq!(bound.id, venue.notification);
    assert_eq!(bound.timeout_secs, 15);

    let missing = DeviceIdentifier::parse("no-such-beacon-anywhere").expect("identifier");
    assert!(catalog.location_device(&missing).await.expect("lookup").is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_catalog_reads_venue() {
    let pool = test_pool().await;
    let venue = create_venue(&pool).await;
    let catalog = PgCatalog::new(pool, Duration::from_secs(60));

    let zone = catalog
        .zone(venue.zone)
        .await
        .expect("Failed to read zone")
        .expect("zone exists");
    assert_eq!(zone.display_endpoint_ids(), vec![venue.display]);

    let display = catalog
        .display_endpoint(venue.display)
        .await
        .expect("Failed to read display")
        .expect("display exists");
    let active: Vec<NotificationId> = display.active_notifications().iter().map(|n| n.id).collect();
    assert_eq!(active, vec![venue.notification]);

    let by_id = catalog
        .location_device_by_id(venue.device)
        .await
        .expect("Failed to read device");
    assert_eq!(by_id.map(|d| d.id), Some(venue.device));

    let mut coupons: Vec<CouponId> = catalog
        .coupons_for_notifications(&[venue.notification])
        .await
        .expect("Failed to read coupons")
        .iter()
        .map(|c| c.id)
        .collect();
    coupons.sort_unstable();
    assert_eq!(coupons, venue.coupons.to_vec());

    assert!(catalog.user_exists(venue.user).await.expect("user lookup"));
    assert!(!catalog.user_exists(UserId::new(i64::MAX)).await.expect("user lookup"));

    let zones = catalog
        .display_endpoint_zones()
        .await
        .expect("Failed to read display zones");
    assert_eq!(zones.get(&venue.display), Some(&venue.zone));
}
