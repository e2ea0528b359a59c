//! Still-frame extraction through an ffmpeg subprocess.
//!
//! Frames are requested with exact-time semantics: the seek is placed on
//! the output side (`-i` before `-ss`), so ffmpeg decodes up to the exact
//! requested timestamp instead of snapping to the nearest keyframe. The
//! single frame is piped out as PNG and decoded with the `image` crate.

use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use thiserror::Error;

use crate::models::MediaTime;

/// Errors from frame extraction.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Source file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to extract frame at {at}: {message}")]
    ExtractionFailed { at: String, message: String },

    #[error("Failed to decode extracted frame at {at}: {message}")]
    DecodeFailed { at: String, message: String },
}

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// A source of still frames for a given asset and timestamp.
///
/// The production implementation shells out to ffmpeg; tests substitute
/// an in-memory source.
pub trait FrameSource: Send + Sync {
    /// Extract the frame at `at`, exact-time.
    ///
    /// With `max_dimension` set, the longer edge is capped to it with the
    /// aspect ratio preserved (thumbnail use); `None` returns the frame at
    /// the asset's natural size (poster use).
    fn extract_frame(
        &self,
        asset: &Path,
        at: MediaTime,
        max_dimension: Option<u32>,
    ) -> FrameResult<DynamicImage>;
}

/// FFmpeg subprocess-backed frame source.
#[derive(Debug, Default)]
pub struct FfmpegFrameSource;

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self
    }

    /// Check if ffmpeg is available on PATH.
    pub fn is_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// Format a timestamp as `HH:MM:SS.mmm` for ffmpeg arguments.
fn format_time(at: MediaTime) -> String {
    let secs = at.seconds().max(0.0);
    let hours = (secs / 3600.0) as u32;
    let minutes = ((secs % 3600.0) / 60.0) as u32;
    let seconds = secs % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, seconds)
}

/// Build the ffmpeg argument list for an exact-frame extract.
fn build_extract_args(asset: &Path, at: MediaTime) -> Vec<String> {
    vec![
        "-i".to_string(),
        asset.to_string_lossy().into_owned(),
        // output-side seek: exact frame, not nearest keyframe
        "-ss".to_string(),
        format_time(at),
        "-frames:v".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "image2pipe".to_string(),
        "-vcodec".to_string(),
        "png".to_string(),
        "-".to_string(),
    ]
}

impl FrameSource for FfmpegFrameSource {
    fn extract_frame(
        &self,
        asset: &Path,
        at: MediaTime,
        max_dimension: Option<u32>,
    ) -> FrameResult<DynamicImage> {
        if !asset.exists() {
            return Err(FrameError::FileNotFound(asset.display().to_string()));
        }

        let time_str = format_time(at);
        tracing::trace!("Extracting frame at {} from {}", time_str, asset.display());

        let output = Command::new("ffmpeg")
            .args(build_extract_args(asset, at))
            .output()
            .map_err(|e| FrameError::ExtractionFailed {
                at: time_str.clone(),
                message: format!("ffmpeg execution failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameError::ExtractionFailed {
                at: time_str,
                message: stderr.lines().last().unwrap_or("unknown error").to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(FrameError::ExtractionFailed {
                at: time_str,
                message: "ffmpeg produced no frame".to_string(),
            });
        }

        let img = image::load(Cursor::new(output.stdout), image::ImageFormat::Png).map_err(
            |e| FrameError::DecodeFailed {
                at: time_str,
                message: e.to_string(),
            },
        )?;

        Ok(apply_dimension_cap(img, max_dimension))
    }
}

/// Cap the longer edge to `max_dimension`, preserving aspect ratio.
///
/// Never upscales.
pub fn apply_dimension_cap(img: DynamicImage, max_dimension: Option<u32>) -> DynamicImage {
    match max_dimension {
        Some(max) if img.width() > max || img.height() > max => img.thumbnail(max, max),
        _ => img,
    }
}
