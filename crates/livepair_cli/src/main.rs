//! Command-line front end for the pairing exporter.
//!
//! Probes a source movie, builds the trim window around the requested
//! poster time, and runs the full + light pairing export.

mod reveal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use livepair_core::config::ConfigManager;
use livepair_core::export::{
    ExiftoolImageWriter, ExportOrchestrator, ExportRequest, FfmpegTrimExporter, FfmpegVideoWriter,
};
use livepair_core::extraction::FfmpegFrameSource;
use livepair_core::logging::{init_tracing, ExportLogger, LogConfig, LogLevel};
use livepair_core::models::{MediaTime, TimeWindow};
use livepair_core::probe::{probe_asset, PROBE_TIMESCALE};
use livepair_core::reveal::RevealCoordinator;

use crate::reveal::XdgFileBrowser;

/// Export a still/movie pairing from a source movie.
#[derive(Parser, Debug)]
#[command(name = "livepair", version, about)]
struct Args {
    /// Source movie file.
    input: PathBuf,

    /// Poster frame time in seconds (defaults to the movie's midpoint).
    #[arg(long)]
    poster: Option<f64>,

    /// Trim window start in seconds (overrides the derived window).
    #[arg(long, requires = "end")]
    start: Option<f64>,

    /// Trim window end in seconds (overrides the derived window).
    #[arg(long, requires = "start")]
    end: Option<f64>,

    /// Half of the trim window around the poster, in seconds.
    #[arg(long)]
    half_span: Option<f64>,

    /// Output directory (overrides the configured one).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stem for output basenames (defaults to the input filename's stem).
    #[arg(long)]
    base_name: Option<String>,

    /// Config file path.
    #[arg(long, default_value = "livepair.toml")]
    config: PathBuf,

    /// Skip revealing the outputs in the file browser.
    #[arg(long)]
    no_reveal: bool,
}

fn parse_level(level: &str) -> LogLevel {
    match level {
        "debug" => LogLevel::Debug,
        "warn" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

/// Build the trim window, applying explicit bounds when given.
///
/// Explicit bounds must form a non-empty range that contains the poster
/// frame; the exported clip always includes the poster.
fn resolve_window(
    poster: MediaTime,
    duration: MediaTime,
    half_span: MediaTime,
    min_scope: MediaTime,
    bounds: Option<(MediaTime, MediaTime)>,
) -> Result<TimeWindow> {
    let mut window = TimeWindow::initial(poster, duration, half_span, min_scope);
    if let Some((start, end)) = bounds {
        if end <= start {
            bail!("trim end must be after trim start");
        }
        if poster < start || poster > end {
            bail!(
                "poster time {} must lie within the trim window [{} .. {}]",
                poster.to_mmss(),
                start.to_mmss(),
                end.to_mmss()
            );
        }
        window.set_bounds(start, end, duration, min_scope);
    }
    Ok(window)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigManager::new(&args.config);
    config
        .load_or_create()
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    let level = parse_level(&config.settings().logging.level);
    init_tracing(level);

    if let Some(output) = &args.output {
        config.settings_mut().paths.output_folder = output.to_string_lossy().into_owned();
    }
    config.ensure_dirs_exist().context("creating work directories")?;

    if !FfmpegFrameSource::is_available() {
        bail!("ffmpeg not found on PATH");
    }

    let asset = probe_asset(&args.input)?;
    tracing::info!(
        "Probed {}: {} ({}x{})",
        asset.path.display(),
        asset.duration.to_mmss(),
        asset.width,
        asset.height
    );

    let settings = config.settings().clone();
    let poster = match args.poster {
        Some(seconds) => MediaTime::from_seconds(seconds, PROBE_TIMESCALE),
        None => MediaTime::new(asset.duration.value() / 2, asset.duration.timescale())
            .promote_timescale(PROBE_TIMESCALE),
    };
    if poster > asset.duration || poster.seconds() < 0.0 {
        bail!(
            "poster time {} is outside the movie ({})",
            poster.to_mmss(),
            asset.duration.to_mmss()
        );
    }

    let half_span = MediaTime::from_seconds(
        args.half_span.unwrap_or(settings.export.half_span_seconds),
        PROBE_TIMESCALE,
    );
    let min_scope = MediaTime::from_seconds(settings.export.min_scope_seconds, PROBE_TIMESCALE);

    let bounds = match (args.start, args.end) {
        (Some(start), Some(end)) => Some((
            MediaTime::from_seconds(start, PROBE_TIMESCALE),
            MediaTime::from_seconds(end, PROBE_TIMESCALE),
        )),
        _ => None,
    };
    let window = resolve_window(poster, asset.duration, half_span, min_scope, bounds)?;
    tracing::info!(
        "Trim window [{} .. {}], poster at {}",
        window.start.to_mmss(),
        window.end.to_mmss(),
        window.poster.to_mmss()
    );

    let base_name = match args.base_name {
        Some(name) => name,
        None => args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string()),
    };

    let log_config = LogConfig {
        level,
        tail_lines: settings.logging.tail_lines as usize,
        show_timestamps: settings.logging.show_timestamps,
    };
    let logger = Arc::new(
        ExportLogger::new(&base_name, config.logs_folder(), log_config, None)
            .context("creating export log")?,
    );

    let trim = FfmpegTrimExporter::new()
        .with_light_bounds(settings.export.light_max_width, settings.export.light_max_height)
        .with_light_bitrate(&settings.export.light_video_bitrate);

    let mut orchestrator = ExportOrchestrator::new(
        &settings.paths.temp_root,
        &settings.paths.output_folder,
        Arc::new(FfmpegFrameSource::new()),
        Arc::new(trim),
        Arc::new(ExiftoolImageWriter::new()),
        Arc::new(FfmpegVideoWriter::new()),
    )
    .with_logger(Arc::clone(&logger))
    .with_light_poster_long_edge(settings.export.light_poster_long_edge);

    if settings.export.reveal_outputs && !args.no_reveal {
        orchestrator = orchestrator.with_reveal(RevealCoordinator::new(
            Arc::new(XdgFileBrowser::new()),
            &settings.export.file_browser_app_id,
        ));
    }

    let request = ExportRequest {
        asset,
        window,
        base_name,
    };
    let handle = orchestrator
        .start_export(request)
        .context("starting export")?;
    let outcome = handle
        .wait()
        .context("export worker exited without reporting")?;

    match (&outcome.full, &outcome.light) {
        (Ok(full), Some(Ok(light))) => {
            println!("Full pairing:  {}", full.image.display());
            println!("               {}", full.video.display());
            println!("Light pairing: {}", light.image.display());
            println!("               {}", light.video.display());
            Ok(())
        }
        (Ok(full), Some(Err(e))) => {
            println!("Full pairing:  {}", full.image.display());
            println!("               {}", full.video.display());
            eprintln!("Light export failed: {}", e);
            eprintln!("Log: {}", logger.log_path().display());
            std::process::exit(2);
        }
        (Err(e), _) => {
            eprintln!("Export failed: {}", e);
            eprintln!("Log: {}", logger.log_path().display());
            std::process::exit(1);
        }
        (Ok(_), None) => unreachable!("light phase always runs after a full success"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(seconds: f64) -> MediaTime {
        MediaTime::from_seconds(seconds, PROBE_TIMESCALE)
    }

    #[test]
    fn explicit_bounds_must_contain_poster() {
        let err = resolve_window(t(30.0), t(60.0), t(1.5), t(3.0), Some((t(40.0), t(50.0))))
            .unwrap_err();
        assert!(err.to_string().contains("must lie within"));

        let err = resolve_window(t(30.0), t(60.0), t(1.5), t(3.0), Some((t(10.0), t(20.0))))
            .unwrap_err();
        assert!(err.to_string().contains("must lie within"));
    }

    #[test]
    fn explicit_bounds_around_poster_are_applied() {
        let window = resolve_window(t(30.0), t(60.0), t(1.5), t(3.0), Some((t(25.0), t(35.0))))
            .unwrap();
        assert_eq!(window.start, t(25.0));
        assert_eq!(window.end, t(35.0));
        assert_eq!(window.poster, t(30.0));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = resolve_window(t(30.0), t(60.0), t(1.5), t(3.0), Some((t(35.0), t(25.0))))
            .unwrap_err();
        assert!(err.to_string().contains("after trim start"));
    }

    #[test]
    fn no_bounds_derives_window_from_poster() {
        let window = resolve_window(t(30.0), t(60.0), t(1.5), t(3.0), None).unwrap();
        assert_eq!(window.start, t(28.5));
        assert_eq!(window.end, t(31.5));
    }
}
