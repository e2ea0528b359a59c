//! Source asset probing using ffprobe.
//!
//! Resolves a movie file into a [`MediaAsset`] carrying its rational
//! duration and pixel dimensions. The asset is read-only for the rest of
//! the pipeline and may be read concurrently by the frame extractor and
//! the trim exporter.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use thiserror::Error;

use crate::models::MediaTime;

/// Timescale used for durations parsed from ffprobe's decimal seconds.
pub const PROBE_TIMESCALE: i32 = 600;

/// Errors from probing a source file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Source file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("ffprobe failed to run: {0}")]
    ProbeFailed(String),

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("Failed to parse ffprobe output: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("No video stream in {0}")]
    NoVideoStream(PathBuf),
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// A probed source movie.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    /// Path to the source container.
    pub path: PathBuf,
    /// Total duration on the asset's timeline.
    pub duration: MediaTime,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

impl MediaAsset {
    /// Height-over-width aspect ratio.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        }
    }
}

/// Probe a movie file with ffprobe.
pub fn probe_asset(path: &Path) -> ProbeResult<MediaAsset> {
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    tracing::debug!("Probing asset: {}", path.display());

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ProbeError::ProbeFailed(format!("ffprobe execution failed: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::CommandFailed {
            tool: "ffprobe".to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: stderr.to_string(),
        });
    }

    let json: Value = serde_json::from_slice(&output.stdout)?;
    parse_probe_json(&json, path)
}

/// Parse the JSON output from ffprobe.
fn parse_probe_json(json: &Value, path: &Path) -> ProbeResult<MediaAsset> {
    let streams = json.get("streams").and_then(|s| s.as_array());
    let stream = streams
        .and_then(|s| s.first())
        .ok_or_else(|| ProbeError::NoVideoStream(path.to_path_buf()))?;

    let width = stream.get("width").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

    // Stream duration where present, falling back to the container's.
    let duration_secs = duration_field(stream)
        .or_else(|| json.get("format").and_then(duration_field))
        .unwrap_or(0.0);

    Ok(MediaAsset {
        path: path.to_path_buf(),
        duration: MediaTime::from_seconds(duration_secs, PROBE_TIMESCALE),
        width,
        height,
    })
}

fn duration_field(obj: &Value) -> Option<f64> {
    obj.get("duration")
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_and_format_fields() {
        let json: Value = serde_json::from_str(
            r#"{
                "streams": [{"width": 1920, "height": 1080, "duration": "60.000000"}],
                "format": {"duration": "60.033000"}
            }"#,
        )
        .unwrap();

        let asset = parse_probe_json(&json, Path::new("movie.mp4")).unwrap();
        assert_eq!(asset.width, 1920);
        assert_eq!(asset.height, 1080);
        assert_eq!(asset.duration, MediaTime::from_seconds(60.0, 600));
    }

    #[test]
    fn falls_back_to_container_duration() {
        let json: Value = serde_json::from_str(
            r#"{
                "streams": [{"width": 640, "height": 480}],
                "format": {"duration": "12.500000"}
            }"#,
        )
        .unwrap();

        let asset = parse_probe_json(&json, Path::new("movie.mp4")).unwrap();
        assert_eq!(asset.duration, MediaTime::from_seconds(12.5, 600));
    }

    #[test]
    fn missing_video_stream_is_an_error() {
        let json: Value = serde_json::from_str(r#"{"streams": []}"#).unwrap();
        let err = parse_probe_json(&json, Path::new("audio.m4a")).unwrap_err();
        assert!(matches!(err, ProbeError::NoVideoStream(_)));
    }

    #[test]
    fn aspect_ratio() {
        let asset = MediaAsset {
            path: PathBuf::from("m.mp4"),
            duration: MediaTime::from_seconds(1.0, 600),
            width: 1920,
            height: 1080,
        };
        assert!((asset.aspect_ratio() - 0.5625).abs() < 1e-9);
    }
}
