//! Desktop file browser integration for Linux.

use std::path::PathBuf;
use std::process::Command;

use livepair_core::reveal::FileBrowser;

/// File browser backed by the freedesktop `FileManager1` interface, with
/// an `xdg-open` fallback on the containing directory.
#[derive(Debug, Default)]
pub struct XdgFileBrowser;

impl XdgFileBrowser {
    pub fn new() -> Self {
        Self
    }

    fn show_items(paths: &[PathBuf]) -> bool {
        let uris: Vec<String> = paths
            .iter()
            .map(|p| format!("file://{}", p.display()))
            .collect();
        let status = Command::new("dbus-send")
            .args([
                "--session",
                "--print-reply",
                "--dest=org.freedesktop.FileManager1",
                "/org/freedesktop/FileManager1",
                "org.freedesktop.FileManager1.ShowItems",
                &format!("array:string:{}", uris.join(",")),
                "string:",
            ])
            .status();
        matches!(status, Ok(s) if s.success())
    }
}

impl FileBrowser for XdgFileBrowser {
    fn reveal(&self, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        if Self::show_items(paths) {
            return;
        }
        // Fallback: open the directory without selecting anything.
        if let Some(dir) = paths[0].parent() {
            if let Err(e) = Command::new("xdg-open").arg(dir).status() {
                tracing::warn!("Failed to open {}: {}", dir.display(), e);
            }
        }
    }

    fn frontmost_app_id(&self) -> Option<String> {
        // No portable way to query the focused application from a CLI;
        // the coordinator falls back to its timeout.
        None
    }
}
