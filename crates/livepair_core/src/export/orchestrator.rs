//! The export state machine.
//!
//! One orchestrator instance drives one pipeline: `Idle → Exporting →
//! Idle`, where the busy guard covers the full-resolution phase only.
//! Once the full pairing settles the pipeline accepts new requests again;
//! the light pairing and the reveal run as a continuation on the same
//! worker without holding the guard. The light phase never runs unless
//! the full pairing deposited. The busy phase is owned by the instance,
//! not by any process-wide flag, and a request arriving while the full
//! phase is running is rejected synchronously, never queued.
//!
//! All long-running work happens on a dedicated worker thread; the caller
//! gets an [`ExportHandle`] and observes completion through its channel.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::extraction::FrameSource;
use crate::logging::ExportLogger;
use crate::models::{
    ExportPhase, MediaTime, OutputPathSet, PairingIdentity, TimeWindow, TrimStatus, LIGHT_PREFIX,
};
use crate::probe::MediaAsset;
use crate::reveal::RevealCoordinator;

use super::errors::{ExportError, ExportResult};
use super::trim::{TrimExporter, TrimPreset};
use super::writers::IdentifierWriter;

/// Long-edge target for the light pairing's poster image, in pixels.
const LIGHT_POSTER_LONG_EDGE: u32 = 1000;

/// JPEG quality for the staged poster (maximum; the final compression is
/// the image writer's concern).
const STAGING_JPEG_QUALITY: u8 = 100;

/// Identity allocation seam; the default is [`PairingIdentity::allocate`].
pub type IdentityAllocator =
    dyn Fn(&str, MediaTime, Option<&str>) -> PairingIdentity + Send + Sync;

/// Everything the pipeline needs for one export invocation.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Probed source movie.
    pub asset: MediaAsset,
    /// Trim/poster window. Read-only for the pipeline.
    pub window: TimeWindow,
    /// Stem for output basenames, typically the source filename's stem.
    pub base_name: String,
}

/// The two final paths of one deposited pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingPaths {
    pub image: PathBuf,
    pub video: PathBuf,
}

/// Terminal result of one export invocation.
#[derive(Debug)]
pub struct ExportOutcome {
    /// Identifier of the job this outcome belongs to.
    pub job_id: String,
    /// Full-resolution pairing result.
    pub full: Result<PairingPaths, ExportError>,
    /// Light pairing result; `None` when the full phase failed and the
    /// light phase was skipped. A light failure does not roll back the
    /// full pairing.
    pub light: Option<Result<PairingPaths, ExportError>>,
}

impl ExportOutcome {
    /// Both pairings deposited.
    pub fn is_complete(&self) -> bool {
        self.full.is_ok() && matches!(self.light, Some(Ok(_)))
    }
}

/// Handle to an in-flight export.
pub struct ExportHandle {
    job_id: String,
    receiver: Receiver<ExportOutcome>,
}

impl ExportHandle {
    /// The job identifier.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Block until the export reaches a terminal outcome.
    ///
    /// `None` only if the worker disappeared without reporting.
    pub fn wait(self) -> Option<ExportOutcome> {
        self.receiver.recv().ok()
    }

    /// Non-blocking check for a terminal outcome.
    pub fn try_wait(&self) -> Option<ExportOutcome> {
        self.receiver.try_recv().ok()
    }
}

/// Drives full and light pairing exports for one source asset at a time.
pub struct ExportOrchestrator {
    phase: Arc<Mutex<ExportPhase>>,
    temp_dir: PathBuf,
    output_dir: PathBuf,
    frames: Arc<dyn FrameSource>,
    trim: Arc<dyn TrimExporter>,
    image_writer: Arc<dyn IdentifierWriter>,
    video_writer: Arc<dyn IdentifierWriter>,
    reveal: Option<Arc<RevealCoordinator>>,
    logger: Option<Arc<ExportLogger>>,
    allocator: Arc<IdentityAllocator>,
    light_poster_long_edge: u32,
}

impl ExportOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        frames: Arc<dyn FrameSource>,
        trim: Arc<dyn TrimExporter>,
        image_writer: Arc<dyn IdentifierWriter>,
        video_writer: Arc<dyn IdentifierWriter>,
    ) -> Self {
        Self {
            phase: Arc::new(Mutex::new(ExportPhase::Idle)),
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
            frames,
            trim,
            image_writer,
            video_writer,
            reveal: None,
            logger: None,
            allocator: Arc::new(|base, poster, prefix| {
                PairingIdentity::allocate(base, poster, prefix)
            }),
            light_poster_long_edge: LIGHT_POSTER_LONG_EDGE,
        }
    }

    /// Reveal outputs in the file browser after a complete export.
    pub fn with_reveal(mut self, coordinator: RevealCoordinator) -> Self {
        self.reveal = Some(Arc::new(coordinator));
        self
    }

    /// Attach a per-export logger.
    pub fn with_logger(mut self, logger: Arc<ExportLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replace the identity allocator.
    pub fn with_identity_allocator<F>(mut self, allocator: F) -> Self
    where
        F: Fn(&str, MediaTime, Option<&str>) -> PairingIdentity + Send + Sync + 'static,
    {
        self.allocator = Arc::new(allocator);
        self
    }

    /// Override the light poster's long-edge target.
    pub fn with_light_poster_long_edge(mut self, pixels: u32) -> Self {
        self.light_poster_long_edge = pixels;
        self
    }

    /// Current pipeline phase.
    pub fn phase(&self) -> ExportPhase {
        *self.phase.lock()
    }

    /// Whether a full-phase export is in flight (drives the UI affordance).
    ///
    /// Returns `false` once the full pairing has settled, even while the
    /// previous job's light continuation is still running.
    pub fn is_busy(&self) -> bool {
        self.phase() != ExportPhase::Idle
    }

    /// Start an export for `request`.
    ///
    /// Rejects with [`ExportError::Busy`], synchronously and with zero
    /// side effects, while another full phase is running. On acceptance the
    /// work moves to a worker thread and the returned handle observes the
    /// outcome.
    pub fn start_export(&self, request: ExportRequest) -> ExportResult<ExportHandle> {
        {
            let mut phase = self.phase.lock();
            if *phase != ExportPhase::Idle {
                tracing::debug!("Export request rejected: pipeline is {}", *phase);
                return Err(ExportError::Busy);
            }
            *phase = ExportPhase::ExportingFull;
        }

        let job_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel();
        let worker = Worker {
            phase: Arc::clone(&self.phase),
            temp_dir: self.temp_dir.clone(),
            output_dir: self.output_dir.clone(),
            frames: Arc::clone(&self.frames),
            trim: Arc::clone(&self.trim),
            image_writer: Arc::clone(&self.image_writer),
            video_writer: Arc::clone(&self.video_writer),
            reveal: self.reveal.clone(),
            logger: self.logger.clone(),
            allocator: Arc::clone(&self.allocator),
            light_poster_long_edge: self.light_poster_long_edge,
        };

        let worker_job_id = job_id.clone();
        thread::Builder::new()
            .name("livepair-export".to_string())
            .spawn(move || worker.run(request, worker_job_id, sender))
            .map_err(|e| {
                *self.phase.lock() = ExportPhase::Idle;
                ExportError::io("spawning export worker", e)
            })?;

        Ok(ExportHandle { job_id, receiver })
    }
}

/// Per-job worker state, moved onto the export thread.
struct Worker {
    phase: Arc<Mutex<ExportPhase>>,
    temp_dir: PathBuf,
    output_dir: PathBuf,
    frames: Arc<dyn FrameSource>,
    trim: Arc<dyn TrimExporter>,
    image_writer: Arc<dyn IdentifierWriter>,
    video_writer: Arc<dyn IdentifierWriter>,
    reveal: Option<Arc<RevealCoordinator>>,
    logger: Option<Arc<ExportLogger>>,
    allocator: Arc<IdentityAllocator>,
    light_poster_long_edge: u32,
}

impl Worker {
    fn run(self, request: ExportRequest, job_id: String, sender: Sender<ExportOutcome>) {
        self.log_phase("Full export");
        let full = self.run_pairing(&request, None, TrimPreset::Passthrough, None);

        // The guard covers the full phase only; a new export may start
        // while the light continuation below is still running. After this
        // point the worker never touches the phase again.
        *self.phase.lock() = ExportPhase::Idle;

        let light = match &full {
            Ok(paths) => {
                self.log_success(&format!(
                    "Full pairing deposited: {} / {}",
                    paths.image.display(),
                    paths.video.display()
                ));
                self.log_phase("Light export");
                Some(self.run_pairing(
                    &request,
                    Some(LIGHT_PREFIX),
                    TrimPreset::Light,
                    Some(self.light_poster_long_edge),
                ))
            }
            Err(e) => {
                self.log_error(&format!("Full export failed: {}", e));
                None
            }
        };

        match &light {
            Some(Ok(paths)) => self.log_success(&format!(
                "Light pairing deposited: {} / {}",
                paths.image.display(),
                paths.video.display()
            )),
            Some(Err(e)) => {
                // the full pairing on disk stays; only the reveal is skipped
                self.log_error(&format!("Light export failed: {}", e));
            }
            None => {}
        }

        if let (Ok(full_paths), Some(Ok(light_paths))) = (&full, &light) {
            if let Some(reveal) = &self.reveal {
                reveal.reveal_and_wait(&[
                    full_paths.image.clone(),
                    full_paths.video.clone(),
                    light_paths.image.clone(),
                    light_paths.video.clone(),
                ]);
            }
        }

        let _ = sender.send(ExportOutcome {
            job_id,
            full,
            light,
        });
    }

    /// Produce one pairing (full or light) end to end.
    fn run_pairing(
        &self,
        request: &ExportRequest,
        prefix: Option<&str>,
        preset: TrimPreset,
        poster_cap: Option<u32>,
    ) -> ExportResult<PairingPaths> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ExportError::io("creating output directory", e))?;
        fs::create_dir_all(&self.temp_dir)
            .map_err(|e| ExportError::io("creating temp directory", e))?;

        let identity = (self.allocator)(&request.base_name, request.window.poster, prefix);
        let paths = OutputPathSet::resolve(&identity, &self.temp_dir, &self.output_dir);

        // fail closed before any write; nothing to clean up on this path
        if let Some(taken) = paths.existing_path() {
            self.log_error(&format!("Target path already exists: {}", taken.display()));
            return Err(ExportError::PathCollision {
                path: taken.to_path_buf(),
            });
        }

        let result = self.stage_and_promote(request, &identity, &paths, preset, poster_cap);
        self.cleanup_temps(&paths);
        result
    }

    fn stage_and_promote(
        &self,
        request: &ExportRequest,
        identity: &PairingIdentity,
        paths: &OutputPathSet,
        preset: TrimPreset,
        poster_cap: Option<u32>,
    ) -> ExportResult<PairingPaths> {
        // Poster still first: a failed extract aborts before temp_video
        // is ever touched.
        let poster =
            self.frames
                .extract_frame(&request.asset.path, request.window.poster, poster_cap)?;
        self.write_staging_image(&poster, &paths.temp_image)?;
        self.log_info(&format!("Staged poster image: {}", paths.temp_image.display()));

        let range = request.window.trim_range(request.asset.duration);
        self.log_info(&format!(
            "Trim export [{} .. {}] -> {}",
            range.start.to_mmss(),
            range.end.to_mmss(),
            paths.temp_video.display()
        ));
        let status = self
            .trim
            .export(&request.asset.path, range, preset, &paths.temp_video);
        if status != TrimStatus::Completed {
            return Err(ExportError::TrimExportFailed { status });
        }

        // Embed the same identifier in both members. Order is image then
        // video; a failure on either side must leave no half pairing.
        if let Err(e) =
            self.image_writer
                .write_with_identifier(&paths.temp_image, &paths.final_image, identity.id())
        {
            self.rollback_final(&paths.final_image);
            return Err(ExportError::embedding("image", e));
        }
        self.log_info(&format!("Pairing image created: {}", paths.final_image.display()));

        if let Err(e) =
            self.video_writer
                .write_with_identifier(&paths.temp_video, &paths.final_video, identity.id())
        {
            self.rollback_final(&paths.final_video);
            self.rollback_final(&paths.final_image);
            return Err(ExportError::embedding("video", e));
        }
        self.log_info(&format!("Pairing video created: {}", paths.final_video.display()));

        Ok(PairingPaths {
            image: paths.final_image.clone(),
            video: paths.final_video.clone(),
        })
    }

    /// Encode the poster to the staged image file, atomically.
    fn write_staging_image(&self, poster: &DynamicImage, dest: &Path) -> ExportResult<()> {
        let part = dest.with_extension("part");
        let file =
            File::create(&part).map_err(|e| ExportError::io("creating staging image", e))?;
        let mut writer = BufWriter::new(file);

        // JPEG has no alpha
        let rgb = DynamicImage::ImageRgb8(poster.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut writer, STAGING_JPEG_QUALITY);
        if let Err(e) = rgb.write_with_encoder(encoder) {
            drop(writer);
            let _ = fs::remove_file(&part);
            return Err(ExportError::EncodingFailed {
                message: e.to_string(),
            });
        }
        writer
            .flush()
            .map_err(|e| ExportError::io("flushing staging image", e))?;
        drop(writer);

        fs::rename(&part, dest).map_err(|e| ExportError::io("promoting staging image", e))
    }

    /// Remove a final member that must not survive a failed pairing.
    fn rollback_final(&self, path: &Path) {
        if path.exists() {
            match fs::remove_file(path) {
                Ok(()) => self.log_info(&format!("Rolled back partial pairing member: {}", path.display())),
                Err(e) => self.log_error(&format!(
                    "Failed to roll back {}: {}",
                    path.display(),
                    e
                )),
            }
        }
    }

    /// Best-effort temp removal; runs on every exit path after staging began.
    fn cleanup_temps(&self, paths: &OutputPathSet) {
        for path in [&paths.temp_image, &paths.temp_video] {
            if !path.exists() {
                continue;
            }
            if let Err(e) = fs::remove_file(path) {
                self.log_warn(&format!(
                    "Failed to remove temp file {}: {}",
                    path.display(),
                    e
                ));
            } else {
                tracing::trace!("Removed temp file {}", path.display());
            }
        }
    }

    fn log_info(&self, message: &str) {
        tracing::info!("{}", message);
        if let Some(logger) = &self.logger {
            logger.info(message);
        }
    }

    fn log_warn(&self, message: &str) {
        tracing::warn!("{}", message);
        if let Some(logger) = &self.logger {
            logger.warn(message);
        }
    }

    fn log_error(&self, message: &str) {
        tracing::error!("{}", message);
        if let Some(logger) = &self.logger {
            logger.error(message);
        }
    }

    fn log_phase(&self, name: &str) {
        tracing::info!("=== {} ===", name);
        if let Some(logger) = &self.logger {
            logger.phase(name);
        }
    }

    fn log_success(&self, message: &str) {
        tracing::info!("{}", message);
        if let Some(logger) = &self.logger {
            logger.success(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{FrameError, FrameResult};
    use crate::models::TimeRange;
    use crate::reveal::FileBrowser;
    use crate::export::writers::{WriterError, WriterResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn t(seconds: f64) -> MediaTime {
        MediaTime::from_seconds(seconds, 600)
    }

    fn request(dir: &Path) -> ExportRequest {
        let source = dir.join("source.mov");
        fs::write(&source, b"source-bytes").unwrap();
        let duration = t(60.0);
        ExportRequest {
            asset: MediaAsset {
                path: source,
                duration,
                width: 1920,
                height: 1080,
            },
            window: TimeWindow::initial(t(30.0), duration, t(1.5), t(3.0)),
            base_name: "clip".to_string(),
        }
    }

    struct StillFrames;

    impl FrameSource for StillFrames {
        fn extract_frame(
            &self,
            _asset: &Path,
            _at: MediaTime,
            max_dimension: Option<u32>,
        ) -> FrameResult<DynamicImage> {
            let size = max_dimension.unwrap_or(64).min(64);
            Ok(DynamicImage::new_rgb8(size, size / 2))
        }
    }

    struct NoFrames;

    impl FrameSource for NoFrames {
        fn extract_frame(
            &self,
            _asset: &Path,
            at: MediaTime,
            _max_dimension: Option<u32>,
        ) -> FrameResult<DynamicImage> {
            Err(FrameError::ExtractionFailed {
                at: at.to_mmss(),
                message: "no frame".to_string(),
            })
        }
    }

    /// Writes the dest file and reports the configured status per call.
    struct ScriptedTrim {
        statuses: Vec<TrimStatus>,
        calls: AtomicUsize,
    }

    impl ScriptedTrim {
        fn always(status: TrimStatus) -> Self {
            Self {
                statuses: vec![status],
                calls: AtomicUsize::new(0),
            }
        }

        fn sequence(statuses: Vec<TrimStatus>) -> Self {
            Self {
                statuses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TrimExporter for ScriptedTrim {
        fn export(
            &self,
            _asset: &Path,
            _range: TimeRange,
            _preset: TrimPreset,
            dest: &Path,
        ) -> TrimStatus {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let status = *self
                .statuses
                .get(call)
                .or_else(|| self.statuses.last())
                .unwrap();
            if status == TrimStatus::Completed {
                fs::write(dest, b"trimmed").unwrap();
            }
            status
        }
    }

    /// Trim exporter that blocks until released, to hold the pipeline busy.
    struct BlockingTrim {
        started: mpsc::Sender<()>,
        release: Mutex<Option<Receiver<()>>>,
    }

    impl TrimExporter for BlockingTrim {
        fn export(
            &self,
            _asset: &Path,
            _range: TimeRange,
            _preset: TrimPreset,
            dest: &Path,
        ) -> TrimStatus {
            let _ = self.started.send(());
            if let Some(release) = self.release.lock().take() {
                let _ = release.recv();
            }
            fs::write(dest, b"trimmed").unwrap();
            TrimStatus::Completed
        }
    }

    /// Trim exporter that completes the full-phase call, then blocks the
    /// light-phase call until released.
    struct LightBlockingTrim {
        calls: AtomicUsize,
        light_started: mpsc::Sender<()>,
        release: Mutex<Option<Receiver<()>>>,
    }

    impl TrimExporter for LightBlockingTrim {
        fn export(
            &self,
            _asset: &Path,
            _range: TimeRange,
            _preset: TrimPreset,
            dest: &Path,
        ) -> TrimStatus {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                let _ = self.light_started.send(());
                if let Some(release) = self.release.lock().take() {
                    let _ = release.recv();
                }
            }
            fs::write(dest, b"trimmed").unwrap();
            TrimStatus::Completed
        }
    }

    struct CopyWriter;

    impl IdentifierWriter for CopyWriter {
        fn write_with_identifier(
            &self,
            source: &Path,
            dest: &Path,
            _identifier: &str,
        ) -> WriterResult<()> {
            fs::copy(source, dest).map_err(|e| WriterError::SpawnFailed {
                tool: "copy".to_string(),
                source: e,
            })?;
            Ok(())
        }
    }

    /// Fails every call; honors the no-partial-output contract.
    struct RefusingWriter;

    impl IdentifierWriter for RefusingWriter {
        fn write_with_identifier(
            &self,
            _source: &Path,
            _dest: &Path,
            _identifier: &str,
        ) -> WriterResult<()> {
            Err(WriterError::CommandFailed {
                tool: "mock".to_string(),
                exit_code: 1,
                message: "refused".to_string(),
            })
        }
    }

    fn orchestrator(
        dir: &Path,
        trim: Arc<dyn TrimExporter>,
        image_writer: Arc<dyn IdentifierWriter>,
        video_writer: Arc<dyn IdentifierWriter>,
    ) -> ExportOrchestrator {
        ExportOrchestrator::new(
            dir.join("temp"),
            dir.join("out"),
            Arc::new(StillFrames),
            trim,
            image_writer,
            video_writer,
        )
    }

    #[test]
    fn complete_export_deposits_both_pairings_and_cleans_temps() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::always(TrimStatus::Completed)),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(outcome.is_complete());
        let full = outcome.full.unwrap();
        let light = outcome.light.unwrap().unwrap();
        assert!(full.image.exists() && full.video.exists());
        assert!(light.image.exists() && light.video.exists());
        assert!(light
            .image
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("light_"));
        // independent identities: basenames must differ beyond the prefix
        assert_ne!(
            full.image.file_stem().unwrap().to_string_lossy(),
            light
                .image
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .trim_start_matches("light_")
        );
        // every temp is gone
        let temp_entries: Vec<_> = fs::read_dir(dir.path().join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
        assert!(!orch.is_busy());
    }

    #[test]
    fn second_request_while_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let orch = orchestrator(
            dir.path(),
            Arc::new(BlockingTrim {
                started: started_tx,
                release: Mutex::new(Some(release_rx)),
            }),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let handle = orch.start_export(request(dir.path())).unwrap();
        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(orch.is_busy());

        // rejected synchronously, not queued
        let rejected = orch.start_export(request(dir.path()));
        assert!(matches!(rejected, Err(ExportError::Busy)));

        release_tx.send(()).unwrap();
        let outcome = handle.wait().unwrap();
        assert!(outcome.full.is_ok());
        assert!(!orch.is_busy());

        // idle again: a fresh request is accepted
        let again = orch.start_export(request(dir.path())).unwrap();
        assert!(again.wait().is_some());
    }

    #[test]
    fn new_export_accepted_while_light_continuation_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let orch = orchestrator(
            dir.path(),
            Arc::new(LightBlockingTrim {
                calls: AtomicUsize::new(0),
                light_started: started_tx,
                release: Mutex::new(Some(release_rx)),
            }),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let first = orch.start_export(request(dir.path())).unwrap();
        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        // full pairing deposited, light still in flight: not busy anymore
        assert!(!orch.is_busy());
        let second = orch
            .start_export(request(dir.path()))
            .expect("new export must be accepted once the full phase settled");

        release_tx.send(()).unwrap();
        let first_outcome = first.wait().unwrap();
        assert!(first_outcome.is_complete());
        let second_outcome = second.wait().unwrap();
        assert!(second_outcome.full.is_ok());
    }

    #[test]
    fn path_collision_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::always(TrimStatus::Completed)),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        )
        .with_identity_allocator(|base, poster, prefix| {
            let stem = format!("{}-{}-fixed", base, poster.to_filename_component());
            match prefix {
                Some(p) => PairingIdentity::from_parts("fixed", format!("{}_{}", p, stem)),
                None => PairingIdentity::from_parts("fixed", stem),
            }
        });

        // occupy one of the four target paths up front
        let out_dir = dir.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();
        let taken = out_dir.join("clip-00.30.00-fixed.JPG");
        fs::write(&taken, b"taken").unwrap();

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(matches!(
            outcome.full,
            Err(ExportError::PathCollision { .. })
        ));
        assert!(outcome.light.is_none());
        // the occupied file is untouched and nothing else was written
        assert_eq!(fs::read(&taken).unwrap(), b"taken");
        assert!(!out_dir.join("clip-00.30.00-fixed.MOV").exists());
        assert!(!dir.path().join("temp").join("clip-00.30.00-fixed.tiff").exists());
        assert!(!dir.path().join("temp").join("clip-00.30.00-fixed.mov").exists());
    }

    #[test]
    fn extraction_failure_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let orch = ExportOrchestrator::new(
            dir.path().join("temp"),
            dir.path().join("out"),
            Arc::new(NoFrames),
            Arc::new(ScriptedTrim::always(TrimStatus::Completed)),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(matches!(
            outcome.full,
            Err(ExportError::ExtractionFailed(_))
        ));
        assert!(outcome.light.is_none());
        let out_entries: Vec<_> = fs::read_dir(dir.path().join("out")).unwrap().collect();
        assert!(out_entries.is_empty());
    }

    #[test]
    fn trim_failure_cleans_temps_and_skips_light() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::always(TrimStatus::Failed)),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(matches!(
            outcome.full,
            Err(ExportError::TrimExportFailed {
                status: TrimStatus::Failed
            })
        ));
        assert!(outcome.light.is_none());
        let temp_entries: Vec<_> = fs::read_dir(dir.path().join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
        let out_entries: Vec<_> = fs::read_dir(dir.path().join("out")).unwrap().collect();
        assert!(out_entries.is_empty());
        assert!(!orch.is_busy());
    }

    #[test]
    fn partial_pair_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        // image embedding succeeds, video embedding fails
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::always(TrimStatus::Completed)),
            Arc::new(CopyWriter),
            Arc::new(RefusingWriter),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(matches!(
            outcome.full,
            Err(ExportError::EmbeddingFailed { member: "video", .. })
        ));
        // neither member of the pairing may survive
        let out_entries: Vec<_> = fs::read_dir(dir.path().join("out")).unwrap().collect();
        assert!(out_entries.is_empty());
        let temp_entries: Vec<_> = fs::read_dir(dir.path().join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }

    #[test]
    fn light_failure_keeps_full_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::sequence(vec![
                TrimStatus::Completed,
                TrimStatus::Cancelled,
            ])),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        let full = outcome.full.unwrap();
        assert!(full.image.exists() && full.video.exists());
        assert!(matches!(
            outcome.light,
            Some(Err(ExportError::TrimExportFailed {
                status: TrimStatus::Cancelled
            }))
        ));
        assert!(!orch.is_busy());
    }

    struct CountingBrowser {
        revealed: Mutex<Vec<PathBuf>>,
    }

    impl FileBrowser for CountingBrowser {
        fn reveal(&self, paths: &[PathBuf]) {
            self.revealed.lock().extend_from_slice(paths);
        }

        fn frontmost_app_id(&self) -> Option<String> {
            Some("org.files.browser".to_string())
        }
    }

    #[test]
    fn reveal_receives_all_four_final_paths() {
        let dir = tempfile::tempdir().unwrap();
        let browser = Arc::new(CountingBrowser {
            revealed: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::always(TrimStatus::Completed)),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        )
        .with_reveal(
            RevealCoordinator::new(browser.clone(), "org.files.browser")
                .with_timeout(Duration::from_millis(200)),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(browser.revealed.lock().len(), 4);
    }

    #[test]
    fn light_failure_skips_reveal() {
        let dir = tempfile::tempdir().unwrap();
        let browser = Arc::new(CountingBrowser {
            revealed: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(
            dir.path(),
            Arc::new(ScriptedTrim::sequence(vec![
                TrimStatus::Completed,
                TrimStatus::Failed,
            ])),
            Arc::new(CopyWriter),
            Arc::new(CopyWriter),
        )
        .with_reveal(
            RevealCoordinator::new(browser.clone(), "org.files.browser")
                .with_timeout(Duration::from_millis(200)),
        );

        let outcome = orch
            .start_export(request(dir.path()))
            .unwrap()
            .wait()
            .unwrap();

        assert!(!outcome.is_complete());
        assert!(browser.revealed.lock().is_empty());
    }
}
