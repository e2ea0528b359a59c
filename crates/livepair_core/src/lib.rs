//! Livepair Core - Live Photo pairing and export pipeline
//!
//! This crate contains all pairing logic with zero UI dependencies:
//! probing a source movie, computing the trim and scope windows around a
//! poster frame, extracting frames, and running the two-phase full/light
//! pairing export. It can be used by a GUI application or a CLI tool.

pub mod config;
pub mod export;
pub mod extraction;
pub mod logging;
pub mod models;
pub mod probe;
pub mod reveal;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
