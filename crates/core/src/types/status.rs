//! Kind and status enums for catalog entities and inbound events.
//!
//! Inbound enums carry a `#[serde(other)]` catch-all so that an unknown value
//! deserializes successfully and is rejected by validation as invalid input,
//! rather than failing inside the transport's body parser.

use serde::{Deserialize, Serialize};

/// Physical technology of a location device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "location_device_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LocationDeviceKind {
    /// Bluetooth LE iBeacon.
    #[serde(rename = "ibeacon")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "ibeacon"))]
    IBeacon,
    /// Any device kind this service cannot resolve.
    #[serde(other)]
    Unsupported,
}

impl std::fmt::Display for LocationDeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IBeacon => write!(f, "ibeacon"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Kind of an event reported by a display endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DisplayEndpointTouch,
    #[serde(other)]
    Unknown,
}

/// What an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceKind {
    Notification,
    #[serde(other)]
    Unknown,
}

/// MIME type of a notification's content body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "mime_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MimeType {
    #[default]
    None,
    TextPlain,
    ImagePng,
    ImageJpg,
    VideoMp4,
}

/// Whether a user registered or is an anonymous guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Registered,
    #[default]
    Guest,
}

impl std::fmt::Display for UserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

impl std::str::FromStr for UserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "guest" => Ok(Self::Guest),
            _ => Err(format!("invalid user kind: {s}")),
        }
    }
}
