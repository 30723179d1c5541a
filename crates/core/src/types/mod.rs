//! Core types for Proximity.
//!
//! This module provides type-safe wrappers for catalog identifiers and the
//! read-only catalog entities the session engine works against.

pub mod catalog;
pub mod device;
pub mod id;
pub mod status;

pub use catalog::{Coupon, DisplayEndpoint, LocationDevice, Notification, Zone};
pub use device::{DeviceIdentifier, DeviceIdentifierError};
pub use id::*;
pub use status::*;
