//! Error types for the export pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::extraction::FrameError;
use crate::models::TrimStatus;

use super::writers::WriterError;

/// Failures surfaced by the export orchestrator.
///
/// None of these are retried automatically; once the pipeline is idle the
/// caller may re-invoke `start_export`, which allocates a fresh identity.
#[derive(Error, Debug)]
pub enum ExportError {
    /// An export job is already running; the request was rejected before
    /// any side effect.
    #[error("An export is already in progress")]
    Busy,

    /// One of the four target paths already exists; the pairing was
    /// aborted before any I/O.
    #[error("Output path already exists: {path}")]
    PathCollision { path: PathBuf },

    /// Poster frame extraction failed.
    #[error("Poster frame extraction failed: {0}")]
    ExtractionFailed(#[from] FrameError),

    /// Encoding the staged poster image failed.
    #[error("Staging image encode failed: {message}")]
    EncodingFailed { message: String },

    /// The trim exporter reported a non-success terminal status.
    #[error("Trim export {status}")]
    TrimExportFailed { status: TrimStatus },

    /// Embedding the content identifier into a container failed.
    #[error("Identifier embedding failed for {member}: {source}")]
    EmbeddingFailed {
        /// Which pairing member failed ("image" or "video").
        member: &'static str,
        #[source]
        source: WriterError,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    /// Create an I/O error with operation context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an embedding error for one pairing member.
    pub fn embedding(member: &'static str, source: WriterError) -> Self {
        Self::EmbeddingFailed { member, source }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
