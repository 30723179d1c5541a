//! Shared venue-wide session state and the steps that mutate it.
//!
//! Two singleton aggregates hold all live state:
//!
//! - [`DisplayRegistry`] - one [`DisplaySession`] per display endpoint
//!   (rotation slot, last touch, beacon binding, user-presence flag)
//! - [`ZoneRegistry`] - one [`ZoneSession`] per zone, each holding a
//!   [`UserSession`] per user currently seen in that zone
//!
//! Every mutation reads the whole aggregate, changes it in memory and writes
//! the whole aggregate back. The steps in this module are pure: they report a
//! [`Change`] so the caller persists only when something actually changed.

pub mod coupon;
pub mod display;
pub mod rotation;
pub mod sweep;
pub mod zone;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use coupon::{issue_coupons, touched_notification_ids};
pub use display::{DisplayRegistry, DisplaySession, RotationOutcome};
pub use rotation::pick_notification;
pub use sweep::{DisplaySweep, IdleThresholds, sweep_displays, sweep_zones};
pub use zone::{UserSession, ZoneRegistry, ZoneSession};

/// A singleton aggregate persisted whole under a fixed key.
pub trait Registry: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage key of the single instance of this aggregate.
    const KEY: &'static str;

    /// A new, empty aggregate with a fresh identity.
    fn fresh() -> Self;
}

/// An aggregate together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<R> {
    pub version: i64,
    pub registry: R,
}

/// Result of applying a step to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<T> {
    /// The aggregate was changed and must be written back.
    Modified(T),
    /// The aggregate is untouched; writing it back would be a no-op.
    Unchanged(T),
}

impl<T> Change<T> {
    /// Build from a value and a "did anything change" flag.
    pub fn from_flag(value: T, modified: bool) -> Self {
        if modified {
            Self::Modified(value)
        } else {
            Self::Unchanged(value)
        }
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        matches!(self, Self::Modified(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Modified(value) | Self::Unchanged(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Change<U> {
        match self {
            Self::Modified(value) => Change::Modified(f(value)),
            Self::Unchanged(value) => Change::Unchanged(f(value)),
        }
    }
}
