//! Display endpoint routes: touch events and the current notification.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use proximity_core::{DisplayEndpointId, EventKind, EventSourceKind, Notification, NotificationId};

use crate::error::Result;
use crate::services::TouchEvent;
use crate::state::AppState;

/// Body of `POST /display-endpoints/{id}/events`.
#[derive(Debug, Deserialize)]
pub struct TouchEventRequest {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "source_type")]
    pub source_kind: EventSourceKind,
    pub source_id: NotificationId,
    /// Defaults to the time the request was received.
    pub at: Option<DateTime<Utc>>,
}

impl From<TouchEventRequest> for TouchEvent {
    fn from(request: TouchEventRequest) -> Self {
        Self {
            kind: request.kind,
            source_kind: request.source_kind,
            source_id: request.source_id,
            at: request.at.unwrap_or_else(Utc::now),
        }
    }
}

/// Record a touch on a display endpoint.
pub async fn record_event(
    State(state): State<AppState>,
    endpoint: std::result::Result<Path<DisplayEndpointId>, PathRejection>,
    body: std::result::Result<Json<TouchEventRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let Path(endpoint) = endpoint?;
    let Json(body) = body?;

    state.sessions().record_touch(endpoint, body.into()).await?;
    Ok(Json(serde_json::json!({})))
}

/// The notification the endpoint should show right now, or `null`.
pub async fn current_notification(
    State(state): State<AppState>,
    endpoint: std::result::Result<Path<DisplayEndpointId>, PathRejection>,
) -> Result<Json<Option<Notification>>> {
    let Path(endpoint) = endpoint?;

    let notification = state
        .sessions()
        .fetch_notification(endpoint, Utc::now())
        .await?;
    Ok(Json(notification))
}
