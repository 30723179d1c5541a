//! User location reports.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use proximity_core::{Coupon, LocationDeviceKind, UserId};

use crate::error::Result;
use crate::services::LocationReport;
use crate::state::AppState;

/// Body of `POST /users/{id}/locations` and `POST /beacons/locations`.
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    #[serde(rename = "type")]
    pub kind: LocationDeviceKind,
    #[serde(rename = "device_id")]
    pub device_identifier: String,
    /// Defaults to the time the request was received.
    pub at: Option<DateTime<Utc>>,
}

impl From<LocationRequest> for LocationReport {
    fn from(request: LocationRequest) -> Self {
        Self {
            kind: request.kind,
            device_identifier: request.device_identifier,
            at: request.at.unwrap_or_else(Utc::now),
        }
    }
}

/// Record that a user is near a beacon; responds with newly issued coupons.
pub async fn record_location(
    State(state): State<AppState>,
    user: std::result::Result<Path<UserId>, PathRejection>,
    body: std::result::Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<Vec<Coupon>>> {
    let Path(user) = user?;
    let Json(body) = body?;

    let coupons = state.sessions().record_location(user, body.into()).await?;
    Ok(Json(coupons))
}
