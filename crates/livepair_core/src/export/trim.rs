//! Movie trim export through an ffmpeg subprocess.
//!
//! Two fixed presets: a stream-copy passthrough for the full-resolution
//! pairing, and a scaled, bitrate-capped preset for the light pairing.
//! The exporter runs to completion and reports a terminal status; there
//! is no partial-progress reporting.

use std::path::Path;
use std::process::Command;

use crate::models::{TimeRange, TrimStatus};

/// Transcode preset for one trim export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimPreset {
    /// Stream copy, no re-encode (full-resolution pairing).
    Passthrough,
    /// Scaled and bitrate-capped re-encode (light pairing).
    Light,
}

/// Collaborator that writes the trimmed movie for one pairing.
///
/// Blocking: callers run it on a worker, never on the control thread.
/// The returned status is terminal; diagnostics go to the log.
pub trait TrimExporter: Send + Sync {
    fn export(&self, asset: &Path, range: TimeRange, preset: TrimPreset, dest: &Path)
        -> TrimStatus;
}

/// FFmpeg-backed trim exporter.
#[derive(Debug, Clone)]
pub struct FfmpegTrimExporter {
    light_max_width: u32,
    light_max_height: u32,
    light_video_bitrate: String,
}

impl Default for FfmpegTrimExporter {
    fn default() -> Self {
        Self {
            light_max_width: 1280,
            light_max_height: 720,
            light_video_bitrate: "2000k".to_string(),
        }
    }
}

impl FfmpegTrimExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the light preset's bounding box.
    pub fn with_light_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.light_max_width = max_width;
        self.light_max_height = max_height;
        self
    }

    /// Override the light preset's video bitrate (ffmpeg syntax, e.g. "2000k").
    pub fn with_light_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.light_video_bitrate = bitrate.into();
        self
    }

    /// Build the ffmpeg argument list for one trim export.
    fn build_args(&self, asset: &Path, range: TimeRange, preset: TrimPreset, dest: &Path)
        -> Vec<String> {
        // Input-side seek: with stream copy the cut lands on the previous
        // keyframe, which is what a passthrough preset means.
        let mut args = vec![
            "-ss".to_string(),
            format!("{:.4}", range.start.seconds().max(0.0)),
            "-to".to_string(),
            format!("{:.4}", range.end.seconds().max(0.0)),
            "-i".to_string(),
            asset.to_string_lossy().into_owned(),
        ];

        match preset {
            TrimPreset::Passthrough => {
                args.extend(["-map", "0", "-c", "copy"].map(String::from));
            }
            TrimPreset::Light => {
                args.extend([
                    "-vf".to_string(),
                    format!(
                        "scale={}:{}:force_original_aspect_ratio=decrease:force_divisible_by=2",
                        self.light_max_width, self.light_max_height
                    ),
                    "-b:v".to_string(),
                    self.light_video_bitrate.clone(),
                    "-c:a".to_string(),
                    "aac".to_string(),
                ]);
            }
        }

        args.extend(["-f".to_string(), "mov".to_string()]);
        args.push(dest.to_string_lossy().into_owned());
        args
    }
}

impl TrimExporter for FfmpegTrimExporter {
    fn export(
        &self,
        asset: &Path,
        range: TimeRange,
        preset: TrimPreset,
        dest: &Path,
    ) -> TrimStatus {
        let args = self.build_args(asset, range, preset, dest);
        tracing::debug!("$ ffmpeg {}", args.join(" "));

        let output = match Command::new("ffmpeg").args(&args).output() {
            Ok(o) => o,
            Err(e) => {
                tracing::error!("ffmpeg execution failed: {}", e);
                return TrimStatus::Failed;
            }
        };

        if output.status.success() {
            TrimStatus::Completed
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                "ffmpeg trim export failed (exit code {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.lines().last().unwrap_or("unknown error")
            );
            TrimStatus::Failed
        }
    }
}
