//! Container writers that embed the pairing identifier.
//!
//! These are the collaborators that turn a staged file into a final
//! pairing member: content is preserved and the identifier is embedded
//! where a Live-Photo-aware consumer looks for it. The contract is
//! all-or-none: on failure no partial `dest` file is left behind.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Errors from an identifier-embedding writer.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("Failed to run {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} reported success but wrote no output: {path}")]
    MissingOutput { tool: String, path: String },
}

/// Result type for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;

/// Embeds a content identifier into a container while copying it.
///
/// One implementation per container kind; the orchestrator holds one for
/// the image member and one for the video member of a pairing.
pub trait IdentifierWriter: Send + Sync {
    fn write_with_identifier(&self, source: &Path, dest: &Path, identifier: &str)
        -> WriterResult<()>;
}

/// Run a writer command, enforcing the all-or-none output contract.
fn run_writer_command(mut command: Command, tool: &str, dest: &Path) -> WriterResult<()> {
    tracing::debug!("$ {:?}", command);

    let output = command.output().map_err(|e| WriterError::SpawnFailed {
        tool: tool.to_string(),
        source: e,
    })?;

    if !output.status.success() {
        // never leave a partial member behind
        let _ = fs::remove_file(dest);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WriterError::CommandFailed {
            tool: tool.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: stderr.lines().last().unwrap_or("unknown error").to_string(),
        });
    }

    if !dest.exists() {
        return Err(WriterError::MissingOutput {
            tool: tool.to_string(),
            path: dest.display().to_string(),
        });
    }

    Ok(())
}

/// Image writer backed by exiftool.
///
/// Copies the staged image to `dest` with the Apple maker-note content
/// identifier written alongside.
#[derive(Debug, Default)]
pub struct ExiftoolImageWriter;

impl ExiftoolImageWriter {
    pub fn new() -> Self {
        Self
    }

    fn build_args(source: &Path, dest: &Path, identifier: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            dest.to_string_lossy().into_owned(),
            format!("-ContentIdentifier={}", identifier),
            source.to_string_lossy().into_owned(),
        ]
    }
}

impl IdentifierWriter for ExiftoolImageWriter {
    fn write_with_identifier(
        &self,
        source: &Path,
        dest: &Path,
        identifier: &str,
    ) -> WriterResult<()> {
        let mut command = Command::new("exiftool");
        command.args(Self::build_args(source, dest, identifier));
        run_writer_command(command, "exiftool", dest)
    }
}

/// QuickTime movie writer backed by ffmpeg.
///
/// Stream-copies the staged movie while writing the
/// `com.apple.quicktime.content.identifier` metadata key.
#[derive(Debug, Default)]
pub struct FfmpegVideoWriter;

impl FfmpegVideoWriter {
    pub fn new() -> Self {
        Self
    }

    fn build_args(source: &Path, dest: &Path, identifier: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-map".to_string(),
            "0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "use_metadata_tags".to_string(),
            "-metadata".to_string(),
            format!("com.apple.quicktime.content.identifier={}", identifier),
            "-f".to_string(),
            "mov".to_string(),
            dest.to_string_lossy().into_owned(),
        ]
    }
}

impl IdentifierWriter for FfmpegVideoWriter {
    fn write_with_identifier(
        &self,
        source: &Path,
        dest: &Path,
        identifier: &str,
    ) -> WriterResult<()> {
        let mut command = Command::new("ffmpeg");
        command.args(Self::build_args(source, dest, identifier));
        run_writer_command(command, "ffmpeg", dest)
    }
}
