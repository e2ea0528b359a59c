//! Logging infrastructure for LivePair.
//!
//! This module provides:
//! - Per-export loggers with file + UI callback dual output
//! - A tail buffer for error diagnosis
//! - Integration with the `tracing` ecosystem

mod export_logger;
mod types;

pub use export_logger::ExportLogger;
pub use types::{LogConfig, LogLevel, MessagePrefix, UiLogCallback};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to the provided default level, and
/// writes to stderr with timestamps. Call once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_tracing_level().to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}
