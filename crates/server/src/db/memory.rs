//! Process-local implementations of the storage traits.
//!
//! Used by the test suites and for running the engine without a database.
//! Registries round-trip through JSON exactly like the `PostgreSQL` store,
//! so serialization bugs surface here too. Each store can be switched into
//! an unavailable state to exercise degradation paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use proximity_core::session::{Registry, Versioned};
use proximity_core::{
    Coupon, CouponId, DeviceIdentifier, DisplayEndpoint, DisplayEndpointId, LocationDevice,
    LocationDeviceId, NotificationId, UserId, Zone, ZoneId,
};

use super::{AuditLedger, ConfigReader, RepositoryError, SessionStore};

fn unavailable() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

// =============================================================================
// MemorySessionStore
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<MemorySessionStoreInner>,
}

#[derive(Debug, Default)]
struct MemorySessionStoreInner {
    documents: Mutex<HashMap<&'static str, (i64, serde_json::Value)>>,
    unavailable: AtomicBool,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load and save fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current version of a registry, `None` if it was never written.
    pub async fn version<R: Registry>(&self) -> Option<i64> {
        self.inner
            .documents
            .lock()
            .await
            .get(R::KEY)
            .map(|(version, _)| *version)
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    async fn load<R: Registry>(&self) -> Result<Option<Versioned<R>>, RepositoryError> {
        self.check_available()?;

        let documents = self.inner.documents.lock().await;
        let Some((version, body)) = documents.get(R::KEY) else {
            return Ok(None);
        };

        let registry = serde_json::from_value::<R>(body.clone()).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid {} document: {e}", R::KEY))
        })?;

        Ok(Some(Versioned {
            version: *version,
            registry,
        }))
    }

    async fn save<R: Registry>(
        &self,
        registry: &R,
        expected: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        self.check_available()?;

        let body = serde_json::to_value(registry).map_err(|e| {
            RepositoryError::DataCorruption(format!("cannot encode {}: {e}", R::KEY))
        })?;

        let mut documents = self.inner.documents.lock().await;
        let stored = documents.get(R::KEY).map(|(version, _)| *version);
        if stored != expected {
            return Err(RepositoryError::Conflict(format!(
                "{} is at {stored:?}, expected {expected:?}",
                R::KEY
            )));
        }

        let version = stored.map_or(1, |v| v + 1);
        documents.insert(R::KEY, (version, body));
        Ok(version)
    }
}

// =============================================================================
// MemoryCatalog
// =============================================================================

/// In-memory catalog, filled through its `with_*` builders.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    zones: HashMap<ZoneId, String>,
    endpoints: BTreeMap<DisplayEndpointId, DisplayEndpoint>,
    devices: HashMap<LocationDeviceId, LocationDevice>,
    coupons: Vec<Coupon>,
    users: Vec<UserId>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone and its display endpoints.
    #[must_use]
    pub fn with_zone(mut self, zone: Zone) -> Self {
        for endpoint in zone.display_endpoints {
            self.endpoints.insert(endpoint.id, endpoint);
        }
        self.zones.insert(zone.id, zone.name);
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: LocationDevice) -> Self {
        self.devices.insert(device.id, device);
        self
    }

    #[must_use]
    pub fn with_coupon(mut self, coupon: Coupon) -> Self {
        self.coupons.push(coupon);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: UserId) -> Self {
        self.users.push(user);
        self
    }

    /// Make every subsequent lookup fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

impl ConfigReader for MemoryCatalog {
    async fn display_endpoint(
        &self,
        id: DisplayEndpointId,
    ) -> Result<Option<DisplayEndpoint>, RepositoryError> {
        self.check_available()?;
        Ok(self.endpoints.get(&id).cloned())
    }

    async fn location_device(
        &self,
        identifier: &DeviceIdentifier,
    ) -> Result<Option<LocationDevice>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .devices
            .values()
            .find(|d| &d.device_identifier == identifier)
            .cloned())
    }

    async fn location_device_by_id(
        &self,
        id: LocationDeviceId,
    ) -> Result<Option<LocationDevice>, RepositoryError> {
        self.check_available()?;
        Ok(self.devices.get(&id).cloned())
    }

    async fn zone(&self, id: ZoneId) -> Result<Option<Zone>, RepositoryError> {
        self.check_available()?;
        Ok(self.zones.get(&id).map(|name| Zone {
            id,
            name: name.clone(),
            display_endpoints: self
                .endpoints
                .values()
                .filter(|e| e.zone_id == Some(id))
                .cloned()
                .collect(),
        }))
    }

    async fn coupons_for_notifications(
        &self,
        ids: &[NotificationId],
    ) -> Result<Vec<Coupon>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .coupons
            .iter()
            .filter(|c| ids.contains(&c.notification_id))
            .cloned()
            .collect())
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        self.check_available()?;
        Ok(self.users.contains(&id))
    }

    async fn display_endpoint_zones(
        &self,
    ) -> Result<HashMap<DisplayEndpointId, ZoneId>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .endpoints
            .values()
            .filter_map(|e| e.zone_id.map(|zone| (e.id, zone)))
            .collect())
    }
}

// =============================================================================
// MemoryAuditLedger
// =============================================================================

/// One ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user: UserId,
    pub coupon: CouponId,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryAuditLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().await.clone()
    }

    /// Coupons issued to `user`, in issue order.
    pub async fn issued_to(&self, user: UserId) -> Vec<CouponId> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.user == user)
            .map(|e| e.coupon)
            .collect()
    }
}

impl AuditLedger for MemoryAuditLedger {
    async fn append(
        &self,
        user: UserId,
        coupons: &[CouponId],
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        self.entries
            .write()
            .await
            .extend(coupons.iter().map(|&coupon| LedgerEntry {
                user,
                coupon,
                issued_at: at,
            }));
        Ok(())
    }
}
