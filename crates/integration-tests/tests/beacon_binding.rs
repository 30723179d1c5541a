//! Moving beacons take over the displays of the zone they report.

#![allow(clippy::unwrap_used)]

use proximity_core::LocationDeviceId;
use proximity_core::session::DisplayRegistry;
use proximity_integration_tests::{
    AISLE_DISPLAY, RETIRED_BEACON, TABLETS, TABLETS_BEACON, at, service, sighting, user,
};
use proximity_server::db::SessionStore;
use proximity_server::services::ServiceError;

#[tokio::test]
async fn test_beacon_binding_shows_its_notification_until_idle() {
    let service = service();

    let bound = service
        .record_beacon_sighting(sighting(TABLETS_BEACON, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bound.id, TABLETS);

    // A display with nothing configured still shows the bound notification.
    let shown = service
        .fetch_notification(AISLE_DISPLAY, at(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shown.id, TABLETS);

    let report = service.run_eviction_sweep(at(60)).await.unwrap();
    assert_eq!(report.displays.bindings_cleared, 0);

    let report = service.run_eviction_sweep(at(61)).await.unwrap();
    assert_eq!(report.displays.bindings_cleared, 1);
    assert!(
        service
            .fetch_notification(AISLE_DISPLAY, at(62))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_shopper_sighting_of_bound_beacon_also_binds() {
    let service = service();

    let coupons = service
        .record_location(user(1), sighting(TABLETS_BEACON, 0))
        .await
        .unwrap();
    assert!(coupons.is_empty());

    let displays = service
        .store()
        .load::<DisplayRegistry>()
        .await
        .unwrap()
        .unwrap()
        .registry;
    let session = displays.session(AISLE_DISPLAY).unwrap();
    assert_eq!(session.bound_device_id, Some(LocationDeviceId::new(3)));
    assert_eq!(session.bound_at, Some(at(0)));
    assert!(!session.user_present);
}

#[tokio::test]
async fn test_inactive_bound_notification_binds_nothing() {
    let service = service();

    let bound = service
        .record_beacon_sighting(sighting(RETIRED_BEACON, 0))
        .await
        .unwrap();

    assert!(bound.is_none());
    assert_eq!(service.store().version::<DisplayRegistry>().await, None);
}

#[tokio::test]
async fn test_unknown_beacon_is_not_found() {
    let service = service();

    let result = service
        .record_beacon_sighting(sighting("not-installed", 0))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
