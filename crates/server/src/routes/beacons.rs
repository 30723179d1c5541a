//! Beacons reporting their own position.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use proximity_core::Notification;

use super::users::LocationRequest;
use crate::error::Result;
use crate::state::AppState;

/// Bind a moving beacon to the displays of the zone it reports.
pub async fn record_location(
    State(state): State<AppState>,
    body: std::result::Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<Option<Notification>>> {
    let Json(body) = body?;

    let notification = state.sessions().record_beacon_sighting(body.into()).await?;
    Ok(Json(notification))
}
