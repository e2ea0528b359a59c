//! Data models for the LivePair pipeline.
//!
//! This module contains the core data structures used throughout the
//! library:
//! - Rational timestamps and the trim/scope window math
//! - Pairing identities and output path sets
//! - Phase and status enums

mod enums;
mod identity;
mod time;

pub use enums::{ExportPhase, TrimStatus};
pub use identity::{OutputPathSet, PairingIdentity, LIGHT_PREFIX};
pub use time::{MediaTime, TimeRange, TimeWindow};
