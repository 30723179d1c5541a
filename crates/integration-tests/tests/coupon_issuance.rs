//! Coupons follow touches, once per visit.

#![allow(clippy::unwrap_used)]

use proximity_core::CouponId;
use proximity_core::session::ZoneRegistry;
use proximity_integration_tests::{
    BAKERY, BAKERY_BEACON, BAKERY_DISPLAY, CROISSANT, DOUGHNUT, ENTRANCE_BEACON, at, service,
    sighting, touch, user,
};
use proximity_server::db::SessionStore;

fn ids(coupons: &[proximity_core::Coupon]) -> Vec<i64> {
    let mut ids: Vec<i64> = coupons.iter().map(|c| c.id.as_i64()).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_touch_then_sighting_issues_coupons_once() {
    let service = service();
    let shopper = user(1);

    service
        .record_location(shopper, sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 3))
        .await
        .unwrap();

    let issued = service
        .record_location(shopper, sighting(BAKERY_BEACON, 4))
        .await
        .unwrap();
    assert_eq!(ids(&issued), vec![200, 201]);

    let again = service
        .record_location(shopper, sighting(BAKERY_BEACON, 5))
        .await
        .unwrap();
    assert!(again.is_empty());

    let zones = service.store().load::<ZoneRegistry>().await.unwrap().unwrap().registry;
    let session = zones.user_session(BAKERY, shopper).unwrap();
    assert_eq!(
        session.received_coupon_ids,
        vec![CouponId::new(200), CouponId::new(201)]
    );
    assert_eq!(
        service.ledger().issued_to(shopper).await,
        vec![CouponId::new(200), CouponId::new(201)]
    );
}

#[tokio::test]
async fn test_new_touch_issues_only_new_coupons() {
    let service = service();
    let shopper = user(1);

    service
        .record_location(shopper, sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 1))
        .await
        .unwrap();
    service
        .record_location(shopper, sighting(BAKERY_BEACON, 2))
        .await
        .unwrap();

    service
        .record_touch(BAKERY_DISPLAY, touch(CROISSANT, 3))
        .await
        .unwrap();
    let issued = service
        .record_location(shopper, sighting(BAKERY_BEACON, 4))
        .await
        .unwrap();

    assert_eq!(ids(&issued), vec![210]);
}

#[tokio::test]
async fn test_each_shopper_receives_touched_coupons() {
    let service = service();

    service
        .record_location(user(1), sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 1))
        .await
        .unwrap();

    let first = service
        .record_location(user(1), sighting(BAKERY_BEACON, 2))
        .await
        .unwrap();
    let second = service
        .record_location(user(2), sighting(BAKERY_BEACON, 2))
        .await
        .unwrap();

    assert_eq!(ids(&first), vec![200, 201]);
    assert_eq!(ids(&second), vec![200, 201]);
    assert_eq!(service.ledger().entries().await.len(), 4);
}

#[tokio::test]
async fn test_touches_in_other_zones_issue_nothing() {
    let service = service();

    service
        .record_location(user(1), sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 1))
        .await
        .unwrap();

    let issued = service
        .record_location(user(1), sighting(ENTRANCE_BEACON, 2))
        .await
        .unwrap();
    assert!(issued.is_empty());
}

#[tokio::test]
async fn test_ledger_outage_withholds_coupons_until_it_recovers() {
    let service = service();
    let shopper = user(1);

    service
        .record_location(shopper, sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 1))
        .await
        .unwrap();

    service.ledger().set_unavailable(true);
    let issued = service
        .record_location(shopper, sighting(BAKERY_BEACON, 2))
        .await
        .unwrap();
    assert!(issued.is_empty());

    service.ledger().set_unavailable(false);
    assert!(service.ledger().entries().await.is_empty());

    let recovered = service
        .record_location(shopper, sighting(BAKERY_BEACON, 3))
        .await
        .unwrap();
    assert_eq!(ids(&recovered), vec![200, 201]);

    let zones = service.store().load::<ZoneRegistry>().await.unwrap().unwrap().registry;
    let received = &zones.user_session(BAKERY, shopper).unwrap().received_coupon_ids;
    assert_eq!(received, &service.ledger().issued_to(shopper).await);
}

#[tokio::test]
async fn test_returning_after_eviction_starts_a_new_visit() {
    let service = service();
    let shopper = user(1);

    service
        .record_location(shopper, sighting(BAKERY_BEACON, 0))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 1))
        .await
        .unwrap();
    let first = service
        .record_location(shopper, sighting(BAKERY_BEACON, 2))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);

    service.run_eviction_sweep(at(600)).await.unwrap();

    service
        .record_location(shopper, sighting(BAKERY_BEACON, 601))
        .await
        .unwrap();
    service
        .record_touch(BAKERY_DISPLAY, touch(DOUGHNUT, 602))
        .await
        .unwrap();
    let second = service
        .record_location(shopper, sighting(BAKERY_BEACON, 603))
        .await
        .unwrap();

    assert_eq!(ids(&second), vec![200, 201]);
    assert_eq!(service.ledger().issued_to(shopper).await.len(), 4);
}
