//! Read-only venue catalog.
//!
//! The session engine never writes the catalog; it only looks up display
//! endpoints, beacons, zones, coupons and users by key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use proximity_core::{
    Coupon, CouponId, DeviceIdentifier, DisplayEndpoint, DisplayEndpointId, LocationDevice,
    LocationDeviceId, LocationDeviceKind, MimeType, Notification, NotificationId, UserId, Zone,
    ZoneId,
};

use super::RepositoryError;

/// Lookup interface over the static catalog.
pub trait ConfigReader: Send + Sync {
    /// A display endpoint with all its notifications, active or not.
    fn display_endpoint(
        &self,
        id: DisplayEndpointId,
    ) -> impl Future<Output = Result<Option<DisplayEndpoint>, RepositoryError>> + Send;

    /// A beacon by its reported identifier, matched case-insensitively.
    fn location_device(
        &self,
        identifier: &DeviceIdentifier,
    ) -> impl Future<Output = Result<Option<LocationDevice>, RepositoryError>> + Send;

    fn location_device_by_id(
        &self,
        id: LocationDeviceId,
    ) -> impl Future<Output = Result<Option<LocationDevice>, RepositoryError>> + Send;

    /// A zone with its display endpoints and their notifications.
    fn zone(&self, id: ZoneId) -> impl Future<Output = Result<Option<Zone>, RepositoryError>> + Send;

    /// Every coupon attached to any of the given notifications.
    fn coupons_for_notifications(
        &self,
        ids: &[NotificationId],
    ) -> impl Future<Output = Result<Vec<Coupon>, RepositoryError>> + Send;

    fn user_exists(&self, id: UserId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Zone of every display endpoint that has one.
    fn display_endpoint_zones(
        &self,
    ) -> impl Future<Output = Result<HashMap<DisplayEndpointId, ZoneId>, RepositoryError>> + Send;
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    name: String,
    sort_order: i32,
    timeout_secs: i32,
    active: bool,
    show_progress_bar: bool,
    content_mime_type: MimeType,
    content_subject: String,
    content_caption: String,
    content_body: String,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sort_order: row.sort_order,
            timeout_secs: row.timeout_secs,
            active: row.active,
            show_progress_bar: row.show_progress_bar,
            content_mime_type: row.content_mime_type,
            content_subject: row.content_subject,
            content_caption: row.content_caption,
            content_body: row.content_body,
        }
    }
}

/// Notification row joined to the display endpoint it belongs to.
#[derive(Debug, sqlx::FromRow)]
struct EndpointNotificationRow {
    display_endpoint_id: DisplayEndpointId,
    #[sqlx(flatten)]
    notification: NotificationRow,
}

#[derive(Debug, sqlx::FromRow)]
struct DisplayEndpointRow {
    id: DisplayEndpointId,
    zone_id: Option<ZoneId>,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LocationDeviceRow {
    id: LocationDeviceId,
    zone_id: Option<ZoneId>,
    kind: LocationDeviceKind,
    device_identifier: String,
    notification_id: Option<NotificationId>,
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    notification_id: NotificationId,
    name: String,
    code: String,
    description: String,
    discount_cents: Decimal,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            notification_id: row.notification_id,
            name: row.name,
            code: row.code,
            description: row.description,
            discount_cents: row.discount_cents,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "n.id, n.name, n.sort_order, n.timeout_secs, n.active, \
     n.show_progress_bar, n.content_mime_type, n.content_subject, n.content_caption, \
     n.content_body";

const LOCATION_DEVICE_COLUMNS: &str =
    "id, zone_id, kind, device_identifier, notification_id";

// =============================================================================
// PgCatalog
// =============================================================================

/// `PostgreSQL` catalog.
///
/// Display endpoints sit on the notification-fetch hot path and are cached
/// for a short TTL; everything else is read through.
#[derive(Clone)]
pub struct PgCatalog {
    inner: Arc<PgCatalogInner>,
}

struct PgCatalogInner {
    pool: PgPool,
    endpoints: Cache<DisplayEndpointId, Option<DisplayEndpoint>>,
}

impl PgCatalog {
    /// Create a catalog reader with the given endpoint cache TTL.
    #[must_use]
    pub fn new(pool: PgPool, cache_ttl: Duration) -> Self {
        let endpoints = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(PgCatalogInner { pool, endpoints }),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    async fn notification(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM proximity.notification n WHERE n.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Notification::from))
    }

    async fn endpoint_notifications(
        &self,
        endpoints: &[DisplayEndpointId],
    ) -> Result<HashMap<DisplayEndpointId, Vec<Notification>>, RepositoryError> {
        let ids: Vec<i64> = endpoints.iter().map(DisplayEndpointId::as_i64).collect();
        let rows = sqlx::query_as::<_, EndpointNotificationRow>(&format!(
            "SELECT den.display_endpoint_id, {NOTIFICATION_COLUMNS}
             FROM proximity.display_endpoint_notification den
             JOIN proximity.notification n ON n.id = den.notification_id
             WHERE den.display_endpoint_id = ANY($1)
             ORDER BY n.sort_order, n.id"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<DisplayEndpointId, Vec<Notification>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.display_endpoint_id)
                .or_default()
                .push(row.notification.into());
        }
        Ok(grouped)
    }

    async fn load_display_endpoint(
        &self,
        id: DisplayEndpointId,
    ) -> Result<Option<DisplayEndpoint>, RepositoryError> {
        let row = sqlx::query_as::<_, DisplayEndpointRow>(
            "SELECT id, zone_id, name FROM proximity.display_endpoint WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut notifications = self.endpoint_notifications(&[row.id]).await?;
        Ok(Some(DisplayEndpoint {
            id: row.id,
            zone_id: row.zone_id,
            name: row.name,
            notifications: notifications.remove(&row.id).unwrap_or_default(),
        }))
    }

    async fn hydrate_device(
        &self,
        row: LocationDeviceRow,
    ) -> Result<LocationDevice, RepositoryError> {
        let device_identifier = DeviceIdentifier::parse(&row.device_identifier).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid device identifier in database: {e}"))
        })?;

        let bound_notification = match row.notification_id {
            Some(id) => self.notification(id).await?,
            None => None,
        };

        Ok(LocationDevice {
            id: row.id,
            zone_id: row.zone_id,
            kind: row.kind,
            device_identifier,
            bound_notification,
        })
    }
}

impl ConfigReader for PgCatalog {
    #[instrument(skip(self), fields(display_endpoint_id = %id))]
    async fn display_endpoint(
        &self,
        id: DisplayEndpointId,
    ) -> Result<Option<DisplayEndpoint>, RepositoryError> {
        if let Some(cached) = self.inner.endpoints.get(&id).await {
            debug!("Display endpoint cache hit");
            return Ok(cached);
        }

        let endpoint = self.load_display_endpoint(id).await?;
        self.inner.endpoints.insert(id, endpoint.clone()).await;
        Ok(endpoint)
    }

    #[instrument(skip(self), fields(device_identifier = %identifier))]
    async fn location_device(
        &self,
        identifier: &DeviceIdentifier,
    ) -> Result<Option<LocationDevice>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationDeviceRow>(&format!(
            "SELECT {LOCATION_DEVICE_COLUMNS} FROM proximity.location_device
             WHERE LOWER(device_identifier) = $1"
        ))
        .bind(identifier.as_str())
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_device(row).await?)),
            None => Ok(None),
        }
    }

    async fn location_device_by_id(
        &self,
        id: LocationDeviceId,
    ) -> Result<Option<LocationDevice>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationDeviceRow>(&format!(
            "SELECT {LOCATION_DEVICE_COLUMNS} FROM proximity.location_device WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_device(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(zone_id = %id))]
    async fn zone(&self, id: ZoneId) -> Result<Option<Zone>, RepositoryError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM proximity.zone WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        let Some(name) = name else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, DisplayEndpointRow>(
            "SELECT id, zone_id, name FROM proximity.display_endpoint
             WHERE zone_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let ids: Vec<DisplayEndpointId> = rows.iter().map(|r| r.id).collect();
        let mut notifications = self.endpoint_notifications(&ids).await?;

        let display_endpoints = rows
            .into_iter()
            .map(|row| DisplayEndpoint {
                notifications: notifications.remove(&row.id).unwrap_or_default(),
                id: row.id,
                zone_id: row.zone_id,
                name: row.name,
            })
            .collect();

        Ok(Some(Zone {
            id,
            name,
            display_endpoints,
        }))
    }

    async fn coupons_for_notifications(
        &self,
        ids: &[NotificationId],
    ) -> Result<Vec<Coupon>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ids.iter().map(NotificationId::as_i64).collect();
        let rows = sqlx::query_as::<_, CouponRow>(
            "SELECT id, notification_id, name, code, description, discount_cents
             FROM proximity.coupon
             WHERE notification_id = ANY($1)
             ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Coupon::from).collect())
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM proximity.user WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn display_endpoint_zones(
        &self,
    ) -> Result<HashMap<DisplayEndpointId, ZoneId>, RepositoryError> {
        let rows = sqlx::query_as::<_, (DisplayEndpointId, ZoneId)>(
            "SELECT id, zone_id FROM proximity.display_endpoint WHERE zone_id IS NOT NULL",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().collect())
    }
}
