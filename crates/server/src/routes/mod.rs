//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (database)
//!
//! # Display endpoints
//! POST /display-endpoints/{id}/events       - Record a touch (returns {})
//! GET  /display-endpoints/{id}/notification - Current notification or null
//!
//! # Users
//! POST /users/{id}/locations                - Beacon sighting (returns issued coupons)
//!
//! # Beacons
//! POST /beacons/locations                   - Beacon self-report (returns bound notification or null)
//! ```
//!
//! Every request body carries an optional `at` timestamp (RFC 3339); when it
//! is missing the time the request was received is used.

pub mod beacons;
pub mod displays;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/display-endpoints/{id}/events", post(displays::record_event))
        .route(
            "/display-endpoints/{id}/notification",
            get(displays::current_notification),
        )
        .route("/users/{id}/locations", post(users::record_location))
        .route("/beacons/locations", post(beacons::record_location))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::{ServerConfig, SessionConfig};
    use crate::state::AppState;

    /// State backed by a pool that never connects; only requests rejected
    /// before reaching the catalog can be exercised.
    fn state() -> AppState {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/proximity_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            sessions: SessionConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/proximity_test")
            .unwrap();
        AppState::new(config, pool)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = crate::app(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = crate::app(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_touch_on_endpoint_zero_is_bad_request() {
        let (status, body) = send(post_json(
            "/display-endpoints/0/events",
            r#"{"type":"display_endpoint_touch","source_type":"notification","source_id":10}"#,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("display endpoint"));
    }

    #[tokio::test]
    async fn test_non_numeric_endpoint_is_bad_request() {
        let request = Request::get("/display-endpoints/lobby/notification")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_fetch_for_endpoint_zero_is_bad_request() {
        let request = Request::get("/display-endpoints/0/notification")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_event_type_is_bad_request() {
        let (status, body) = send(post_json(
            "/display-endpoints/1/events",
            r#"{"type":"swipe","source_type":"notification","source_id":10}"#,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("display_endpoint_touch"));
    }

    #[tokio::test]
    async fn test_unsupported_device_type_is_bad_request() {
        let (status, body) = send(post_json(
            "/users/1/locations",
            r#"{"type":"eddystone","device_id":"beacon-entrance"}"#,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported"));
    }

    #[tokio::test]
    async fn test_location_for_user_zero_is_bad_request() {
        let (status, _) = send(post_json(
            "/users/0/locations",
            r#"{"type":"ibeacon","device_id":"beacon-entrance"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_device_id_is_bad_request() {
        let (status, _) = send(post_json(
            "/beacons/locations",
            r#"{"type":"ibeacon","device_id":"  "}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = send(post_json("/beacons/locations", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::get("/zones").body(Body::empty()).unwrap();
        let response = crate::app(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
