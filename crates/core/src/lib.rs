//! Proximity Core - Shared types and the session engine.
//!
//! This crate provides the pieces every Proximity component shares:
//! - `server` - Business operations, storage adapters and HTTP transport
//! - `cli` - Command-line tools for migrations, seeding and manual sweeps
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure state transitions - no
//! I/O, no database access, no HTTP. Every engine step takes the registry it
//! mutates plus explicit inputs (the current time, catalog data, a random
//! number generator) and reports whether it changed anything, so callers can
//! persist only when needed.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, device identifiers and catalog entities
//! - [`session`] - Display and zone registries, rotation, presence, coupon
//!   issuance and the eviction sweep

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod session;
#[cfg(test)]
mod test_support;
pub mod types;

pub use types::*;
