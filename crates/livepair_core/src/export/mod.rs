//! Two-phase pairing export.
//!
//! The orchestrator produces a full-resolution pairing, then a reduced
//! "light" pairing, each deposited atomically from staged temp files. See
//! [`orchestrator::ExportOrchestrator`] for the state machine.

pub mod errors;
pub mod orchestrator;
pub mod trim;
pub mod writers;

pub use errors::{ExportError, ExportResult};
pub use orchestrator::{
    ExportHandle, ExportOrchestrator, ExportOutcome, ExportRequest, PairingPaths,
};
pub use trim::{FfmpegTrimExporter, TrimExporter, TrimPreset};
pub use writers::{ExiftoolImageWriter, FfmpegVideoWriter, IdentifierWriter, WriterError};
