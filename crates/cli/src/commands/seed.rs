//! Seed the database with the demo venue.
//!
//! One client with two stores. The Seattle store has four zones:
//!
//! - a placeholder zone with one display, one notification and one coupon
//! - the entrance (scenario 1): a single welcome notification
//! - the bakery (scenario 2): three rotating notifications, each with a coupon
//! - the electronics aisle (scenario 3): two moving beacons, each bound to
//!   its own notification, and a display without a rotation
//!
//! Seeding is skipped when any client already exists, so the command can be
//! run repeatedly.

use proximity_core::{LocationDeviceKind, MimeType, UserKind};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::{PgPool, Postgres, Transaction};

use super::{CommandError, database_url};

struct NotificationSeed {
    name: &'static str,
    sort_order: i32,
    timeout_secs: i32,
    mime_type: MimeType,
    subject: &'static str,
    caption: &'static str,
    body: &'static str,
}

const NOTIFICATIONS: [NotificationSeed; 7] = [
    NotificationSeed {
        name: "Placeholder Notification",
        sort_order: 0,
        timeout_secs: 10,
        mime_type: MimeType::ImagePng,
        subject: "Placeholder Notification",
        caption: "Placeholder advertisement",
        body: "https://example.com/images/placeholder.png",
    },
    NotificationSeed {
        name: "Welcome (Scenario #1)",
        sort_order: 1,
        timeout_secs: 20,
        mime_type: MimeType::ImagePng,
        subject: "Welcome Greetings",
        caption: "Welcome to Demo Mart Seattle!",
        body: "https://example.com/demo-mart/welcome.png",
    },
    NotificationSeed {
        name: "Doughnuts (Scenario #2)",
        sort_order: 1,
        timeout_secs: 10,
        mime_type: MimeType::ImageJpg,
        subject: "Advertisement for Doughnuts",
        caption: "4 Delicious Doughnuts",
        body: "https://example.com/demo-mart/doughnut.jpg",
    },
    NotificationSeed {
        name: "Croissant (Scenario #2)",
        sort_order: 2,
        timeout_secs: 10,
        mime_type: MimeType::ImageJpg,
        subject: "Advertisement for Croissant",
        caption: "Croissant for breakfast needs",
        body: "https://example.com/demo-mart/croissant.jpg",
    },
    NotificationSeed {
        name: "Cola (Scenario #2)",
        sort_order: 3,
        timeout_secs: 10,
        mime_type: MimeType::VideoMp4,
        subject: "Advertisement for Cola",
        caption: "Ice cold",
        body: "https://example.com/demo-mart/cola.mp4",
    },
    NotificationSeed {
        name: "Headphones (Scenario #3)",
        sort_order: 0,
        timeout_secs: 10,
        mime_type: MimeType::TextPlain,
        subject: "Advertisement for Headphones",
        caption: "",
        body: "Noise cancelling, 20% off today",
    },
    NotificationSeed {
        name: "Tablets (Scenario #3)",
        sort_order: 0,
        timeout_secs: 10,
        mime_type: MimeType::TextPlain,
        subject: "Advertisement for Tablets",
        caption: "",
        body: "Trade in your old tablet",
    },
];

/// `(zone index, identifier, bound notification index)`.
const BEACONS: [(usize, &str, Option<usize>); 5] = [
    (0, "placeholder-uuid", None),
    (1, "11111111-1111-1111-1111-111111111111", None),
    (2, "22222222-2222-2222-2222-222222222222", None),
    (3, "33333333-3333-3333-3333-333333333333", Some(5)),
    (3, "44444444-4444-4444-4444-444444444444", Some(6)),
];

/// `(display index, notification index)`.
const DISPLAY_NOTIFICATIONS: [(usize, usize); 5] = [(0, 0), (1, 1), (2, 2), (2, 3), (2, 4)];

/// `(notification index, name, code, description, discount in cents)`.
const COUPONS: [(usize, &str, &str, &str, i64); 4] = [
    (0, "Placeholder Coupon", "00000000000", "SAVE $0.00", 0),
    (2, "Doughnut Coupon", "09876543210", "SAVE $1.99", 199),
    (3, "Croissant Coupon", "92186293264", "SAVE $0.49", 49),
    (4, "Cola Coupon", "97294957293", "SAVE $0.20", 20),
];

/// Seed the demo venue.
///
/// # Errors
///
/// Returns an error if the database URL is missing or any insert fails. All
/// inserts run in one transaction.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proximity.client")
        .fetch_one(&pool)
        .await?;
    if clients > 0 {
        tracing::info!(clients, "Catalog already populated, skipping seed");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    seed_venue(&mut tx).await?;
    tx.commit().await?;

    tracing::info!("Demo venue seeded successfully!");
    Ok(())
}

async fn seed_venue(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    let client: i64 =
        sqlx::query_scalar("INSERT INTO proximity.client (name) VALUES ($1) RETURNING id")
            .bind("Demo Mart")
            .fetch_one(&mut **tx)
            .await?;

    let mut spots = Vec::new();
    for name in ["Demo Mart Seattle", "Demo Mart Los Angeles"] {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO proximity.client_spot (client_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(client)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        spots.push(id);
    }
    let seattle = spots.first().copied().ok_or(sqlx::Error::RowNotFound)?;

    let mut zones = Vec::new();
    for name in [
        "Placeholder Zone",
        "Entrance (Scenario #1)",
        "Bakery (Scenario #2)",
        "Electronics (Scenario #3)",
    ] {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO proximity.zone (client_spot_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(seattle)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        zones.push(id);
    }
    tracing::info!(spots = spots.len(), zones = zones.len(), "Venue created");

    let mut notifications = Vec::new();
    for seed in &NOTIFICATIONS {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO proximity.notification
                (client_id, name, sort_order, timeout_secs, content_mime_type,
                 content_subject, content_caption, content_body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(client)
        .bind(seed.name)
        .bind(seed.sort_order)
        .bind(seed.timeout_secs)
        .bind(seed.mime_type)
        .bind(seed.subject)
        .bind(seed.caption)
        .bind(seed.body)
        .fetch_one(&mut **tx)
        .await?;
        notifications.push(id);
    }

    for (zone, identifier, bound) in BEACONS {
        sqlx::query(
            r"
            INSERT INTO proximity.location_device (zone_id, kind, device_identifier, notification_id)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(zones.get(zone).copied())
        .bind(LocationDeviceKind::IBeacon)
        .bind(identifier)
        .bind(bound.and_then(|index| notifications.get(index).copied()))
        .execute(&mut **tx)
        .await?;
    }

    let mut displays = Vec::new();
    for (zone, name) in zones.iter().zip([
        "Placeholder Display",
        "Demo Display 1",
        "Demo Display 2",
        "Demo Display 3",
    ]) {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO proximity.display_endpoint (zone_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(zone)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        displays.push(id);
    }

    for (display, notification) in DISPLAY_NOTIFICATIONS {
        sqlx::query(
            r"
            INSERT INTO proximity.display_endpoint_notification (display_endpoint_id, notification_id)
            VALUES ($1, $2)
            ",
        )
        .bind(displays.get(display).copied())
        .bind(notifications.get(notification).copied())
        .execute(&mut **tx)
        .await?;
    }
    tracing::info!(
        beacons = BEACONS.len(),
        displays = displays.len(),
        notifications = notifications.len(),
        "Devices and content created"
    );

    for (notification, name, code, description, cents) in COUPONS {
        sqlx::query(
            r"
            INSERT INTO proximity.coupon (notification_id, name, code, description, discount_cents)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(notifications.get(notification).copied())
        .bind(name)
        .bind(code)
        .bind(description)
        .bind(Decimal::from(cents))
        .execute(&mut **tx)
        .await?;
    }

    let users = [
        (UserKind::Registered, Some("Placeholder User"), Some("placeholder.user@example.com")),
        (UserKind::Registered, Some("Demo User"), Some("demo.user@example.com")),
        (UserKind::Guest, None, None),
    ];
    for (kind, name, email) in users {
        sqlx::query("INSERT INTO proximity.user (kind, name, email) VALUES ($1, $2, $3)")
            .bind(kind)
            .bind(name)
            .bind(email)
            .execute(&mut **tx)
            .await?;
    }
    tracing::info!(coupons = COUPONS.len(), users = users.len(), "Coupons and users created");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_indexes_are_in_range() {
        assert!(BEACONS.iter().all(|(zone, _, bound)| {
            *zone < 4 && bound.is_none_or(|index| index < NOTIFICATIONS.len())
        }));
        assert!(
            DISPLAY_NOTIFICATIONS
                .iter()
                .all(|(display, notification)| *display < 4 && *notification < NOTIFICATIONS.len())
        );
        assert!(COUPONS.iter().all(|(notification, ..)| *notification < NOTIFICATIONS.len()));
    }

    #[test]
    fn test_beacon_identifiers_are_unique_ignoring_case() {
        let mut identifiers: Vec<String> =
            BEACONS.iter().map(|(_, id, _)| id.to_lowercase()).collect();
        identifiers.sort();
        identifiers.dedup();
        assert_eq!(identifiers.len(), BEACONS.len());
    }
}
