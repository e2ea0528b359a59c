//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Export pipeline settings.
    #[serde(default)]
    pub export: ExportSettings,

    /// Frame extraction settings.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for finished pairings.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for staged temp files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for per-export log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last opened source movie path.
    #[serde(default)]
    pub last_source_path: String,
}

fn default_output_folder() -> String {
    "pairing_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
            last_source_path: String::new(),
        }
    }
}

/// Export pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Half of the initial trim window around the poster, in seconds.
    #[serde(default = "default_half_span")]
    pub half_span_seconds: f64,

    /// Minimum width of the scrub scope window, in seconds.
    #[serde(default = "default_min_scope")]
    pub min_scope_seconds: f64,

    /// Long-edge pixel target for the light pairing's poster.
    #[serde(default = "default_light_poster_long_edge")]
    pub light_poster_long_edge: u32,

    /// Width bound for the light pairing's video.
    #[serde(default = "default_light_max_width")]
    pub light_max_width: u32,

    /// Height bound for the light pairing's video.
    #[serde(default = "default_light_max_height")]
    pub light_max_height: u32,

    /// Video bitrate for the light pairing.
    #[serde(default = "default_light_bitrate")]
    pub light_video_bitrate: String,

    /// Reveal finished pairings in the file browser.
    #[serde(default = "default_true")]
    pub reveal_outputs: bool,

    /// Application identifier the reveal waits on.
    #[serde(default = "default_file_browser_app_id")]
    pub file_browser_app_id: String,
}

fn default_half_span() -> f64 {
    1.5
}

fn default_min_scope() -> f64 {
    3.0
}

fn default_light_poster_long_edge() -> u32 {
    1000
}

fn default_light_max_width() -> u32 {
    1280
}

fn default_light_max_height() -> u32 {
    720
}

fn default_light_bitrate() -> String {
    "2000k".to_string()
}

fn default_file_browser_app_id() -> String {
    "org.gnome.Nautilus".to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            half_span_seconds: default_half_span(),
            min_scope_seconds: default_min_scope(),
            light_poster_long_edge: default_light_poster_long_edge(),
            light_max_width: default_light_max_width(),
            light_max_height: default_light_max_height(),
            light_video_bitrate: default_light_bitrate(),
            reveal_outputs: true,
            file_browser_app_id: default_file_browser_app_id(),
        }
    }
}

/// Frame extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Long-edge cap for scrub thumbnails, in pixels.
    #[serde(default = "default_thumbnail_max_dimension")]
    pub thumbnail_max_dimension: u32,
}

fn default_thumbnail_max_dimension() -> u32 {
    256
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            thumbnail_max_dimension: default_thumbnail_max_dimension(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to per-export logs: debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Number of trailing lines kept for error reporting.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: u32,

    /// Prefix log lines with timestamps.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tail_lines() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            tail_lines: default_tail_lines(),
            show_timestamps: true,
        }
    }
}

/// Identifies a config section for section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Export,
    Extraction,
    Logging,
}

impl ConfigSection {
    /// The TOML table name this section serializes under.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Export => "export",
            ConfigSection::Extraction => "extraction",
            ConfigSection::Logging => "logging",
        }
    }
}
