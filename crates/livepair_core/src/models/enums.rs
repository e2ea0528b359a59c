//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Where the export pipeline currently is.
///
/// At most one full-resolution export runs per orchestrator instance; any
/// request arriving while the phase is not `Idle` is rejected outright,
/// never queued. The light pairing runs as a continuation after the phase
/// has already returned to `Idle`, so UI affordances re-enable as soon as
/// the full pairing settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    /// No full-phase export in flight; a new request is accepted.
    Idle,
    /// Full-resolution pairing in flight.
    ExportingFull,
}

impl std::fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportPhase::Idle => write!(f, "idle"),
            ExportPhase::ExportingFull => write!(f, "exporting (full)"),
        }
    }
}

/// Terminal status reported by the trim exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimStatus {
    /// Output file fully written.
    Completed,
    /// Exporter reported an error.
    Failed,
    /// Exporter was cancelled before finishing.
    Cancelled,
}

impl std::fmt::Display for TrimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrimStatus::Completed => write!(f, "completed"),
            TrimStatus::Failed => write!(f, "failed"),
            TrimStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
