//! GifTrim - video to size-targeted animated-image timeline.
//!
//! Ingests a video, runs the size optimizer as an undoable edit and prints a
//! JSON report. Logging is controlled with `RUST_LOG` (default `info`).

mod cli;

use anyhow::{Context, Result};
use cli::{Args, Input};
use giftrim_core::EditorSettings;
use giftrim_media::{
    CancelToken, FfmpegDecoder, IngestPipeline, IngestProgress, MediaDecoder, PatternSource,
};
use giftrim_timeline::{estimate_size, Command, EditSession, HistoryState, TimelineOp};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Report {
    source: String,
    frames_imported: usize,
    frames_after: usize,
    duration_seconds: f64,
    estimated_kb_before: u64,
    estimated_kb_after: u64,
    target_kb: u64,
    history: HistoryState,
}

fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    let Some(path) = path
        .map(Path::to_path_buf)
        .or_else(EditorSettings::default_path)
    else {
        return Ok(EditorSettings::default());
    };
    let settings = EditorSettings::load(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    info!("Settings: {}", path.display());
    Ok(settings)
}

fn log_progress(progress: IngestProgress) {
    info!(
        stage = progress.stage.display_name(),
        percent = (progress.overall_progress * 100.0).round(),
        "{}",
        progress.message
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let settings = load_settings(args.settings.as_deref())?;

    info!("GifTrim starting...");

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling import");
                cancel.cancel();
            }
        });
    }

    let pipeline = IngestPipeline::new(settings.ingest.clone())
        .with_optimize_settings(settings.optimize.clone());

    let (source_name, timeline) = match &args.input {
        Input::File(path) => {
            let decoder: Arc<dyn MediaDecoder> = Arc::new(FfmpegDecoder::new());
            let timeline = pipeline
                .ingest_path(decoder, path.clone(), &cancel, log_progress)
                .await
                .with_context(|| format!("importing {}", path.display()))?;
            (path.display().to_string(), timeline)
        }
        Input::Pattern(seconds) => {
            let source = Arc::new(PatternSource::new(*seconds, 30.0, (480, 270)));
            let timeline = pipeline
                .run(source, &cancel, log_progress)
                .await
                .context("importing pattern")?;
            (format!("pattern:{seconds}s"), timeline)
        }
    };

    let frames_imported = timeline.len();
    let estimated_kb_before = estimate_size(&timeline) / 1024;
    let target_kb = args.target_kb.unwrap_or(settings.optimize.target_size_kb);

    let mut session = EditSession::new(timeline, &settings.history);
    let history = session.execute(Command::transform(TimelineOp::AggressiveOptimize {
        target_size_kb: target_kb,
        settings: settings.optimize.clone(),
    }));

    let timeline = session.timeline();
    let report = Report {
        source: source_name,
        frames_imported,
        frames_after: timeline.len(),
        duration_seconds: timeline.total_duration(),
        estimated_kb_before,
        estimated_kb_after: estimate_size(timeline) / 1024,
        target_kb,
        history,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
