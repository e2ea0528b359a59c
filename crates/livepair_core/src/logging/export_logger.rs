//! Per-export logger with file and callback output.
//!
//! Each export run gets its own logger that writes to a dedicated log
//! file, forwards lines to an optional UI callback, and keeps a tail
//! buffer of recent lines for error diagnosis.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, MessagePrefix, UiLogCallback};

/// Per-export logger with dual output (file + UI callback).
pub struct ExportLogger {
    name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    ui_callback: Mutex<Option<UiLogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl ExportLogger {
    /// Create a new export logger writing `<name>.log` under `log_dir`.
    pub fn new(
        name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        ui_callback: Option<UiLogCallback>,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            name,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            ui_callback: Mutex::new(ui_callback),
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(64)),
        })
    }

    /// The logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a warning message.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    /// Log a success message.
    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Recent log lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Flush and close the log file.
    pub fn close(&self) {
        if let Some(mut writer) = self.file_writer.lock().take() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, line: &str) {
        {
            let mut writer = self.file_writer.lock();
            if let Some(w) = writer.as_mut() {
                let _ = writeln!(w, "{}", line);
                let _ = w.flush();
            }
        }

        if let Some(callback) = self.ui_callback.lock().as_ref() {
            callback(line);
        }

        let mut tail = self.tail_buffer.lock();
        if tail.len() >= self.config.tail_lines {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    }
}

impl Drop for ExportLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace filesystem-hostile characters in a log name.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
