//! Application configuration, persisted as TOML.

pub mod manager;
pub mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, ExportSettings, ExtractionSettings, LoggingSettings, PathSettings, Settings,
};
