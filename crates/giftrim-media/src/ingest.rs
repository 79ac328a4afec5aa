//! Video-to-timeline ingest pipeline.
//!
//! Converts a [`VideoSource`] into a [`Timeline`] in four stages:
//! 1. Analyzing: validate duration and video track
//! 2. Computing settings: sampling interval, output size, frame cap
//! 3. Extracting: decode timestamps in fixed-size concurrent batches
//! 4. Post-processing: order by source time, drop duplicates, normalize durations
//!
//! Cancellation is checked at every batch boundary and at the post-processing
//! yield points. A cancelled or failed job produces no timeline.

use crate::cancel::CancelToken;
use crate::decoder::{MediaDecoder, VideoSource};
use crate::dedup;
use crate::error::{DecodeError, IngestError};
use giftrim_core::timing::BASE_FPS;
use giftrim_core::{FrameImage, IngestSettings, OptimizeSettings};
use giftrim_timeline::{aggressive_optimize, Frame, Timeline};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Progress of one ingest job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestProgress {
    pub job_id: Uuid,
    /// Current stage being processed.
    pub stage: IngestStage,
    /// Overall progress (0.0 to 1.0), never decreasing within a job.
    pub overall_progress: f64,
    /// Stage-specific progress (0.0 to 1.0).
    pub stage_progress: f64,
    /// Human-readable status message.
    pub message: String,
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestStage {
    Idle,
    Analyzing,
    ComputingSettings,
    Extracting,
    PostProcessing,
    Done,
    Cancelled,
    Failed,
}

impl IngestStage {
    /// Display name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Analyzing => "Analyzing video",
            Self::ComputingSettings => "Computing extraction settings",
            Self::Extracting => "Extracting frames",
            Self::PostProcessing => "Processing frames",
            Self::Done => "Import complete",
            Self::Cancelled => "Import cancelled",
            Self::Failed => "Import failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed)
    }

    /// Share of overall progress covered by this stage.
    fn span(&self) -> Option<(f64, f64)> {
        match self {
            Self::Idle => Some((0.0, 0.0)),
            Self::Analyzing => Some((0.0, 0.05)),
            Self::ComputingSettings => Some((0.05, 0.1)),
            Self::Extracting => Some((0.1, 0.9)),
            Self::PostProcessing => Some((0.9, 1.0)),
            Self::Done => Some((1.0, 1.0)),
            Self::Cancelled | Self::Failed => None,
        }
    }
}

// ── Extraction planning ────────────────────────────────────────

/// Sampling decisions derived from the source before decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPlan {
    /// Native frames advanced per sample, at least 1.
    pub frame_step: f64,
    /// Seconds between samples.
    pub interval: f64,
    pub output_size: (u32, u32),
    /// Sample times in `[0, duration)`, capped at the frame ceiling.
    pub timestamps: Vec<f64>,
}

/// Step a source width down to a memory-friendly output width.
pub fn capped_width(width: u32) -> u32 {
    match width {
        w if w > 3840 => 1920,
        w if w > 1920 => 1280,
        w => w,
    }
}

/// Output size for a source of `width × height`, preserving aspect ratio.
pub fn output_size((width, height): (u32, u32)) -> (u32, u32) {
    let out_width = capped_width(width);
    if out_width == width || width == 0 {
        return (width, height);
    }
    let out_height = (height as f64 * out_width as f64 / width as f64).round() as u32;
    (out_width, out_height.max(1))
}

/// Derive the sampling plan for a source.
///
/// Never samples finer than the source's native rate. An unknown native rate
/// falls back to sampling at the target rate.
pub fn plan_extraction(
    duration: f64,
    native_fps: f64,
    native_size: (u32, u32),
    settings: &IngestSettings,
) -> ExtractionPlan {
    let target_fps = if settings.target_fps.is_finite() && settings.target_fps > 0.0 {
        settings.target_fps
    } else {
        BASE_FPS
    };

    let (frame_step, interval) = if native_fps.is_finite() && native_fps > 0.0 {
        let step = (native_fps / target_fps).max(1.0);
        (step, step / native_fps)
    } else {
        (1.0, 1.0 / target_fps)
    };

    let timestamps = (0u64..)
        .map(|i| i as f64 * interval)
        .take_while(|t| *t < duration)
        .take(settings.max_frames.max(1))
        .collect();

    ExtractionPlan {
        frame_step,
        interval,
        output_size: output_size(native_size),
        timestamps,
    }
}

// ── Job state ──────────────────────────────────────────────────

/// State of one in-flight ingest. Dropped when the job ends.
struct ExtractionJob<'a, F> {
    id: Uuid,
    stage: IngestStage,
    overall_progress: f64,
    on_progress: &'a mut F,
}

impl<'a, F: FnMut(IngestProgress)> ExtractionJob<'a, F> {
    fn new(on_progress: &'a mut F) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: IngestStage::Idle,
            overall_progress: 0.0,
            on_progress,
        }
    }

    fn report(&mut self, stage: IngestStage, stage_progress: f64, message: impl Into<String>) {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        if let Some((start, end)) = stage.span() {
            let overall = start + (end - start) * stage_progress;
            self.overall_progress = self.overall_progress.max(overall);
        }
        if stage != self.stage {
            debug!(job = %self.id, stage = stage.display_name(), "Ingest stage");
            self.stage = stage;
        }
        (self.on_progress)(IngestProgress {
            job_id: self.id,
            stage,
            overall_progress: self.overall_progress,
            stage_progress,
            message: message.into(),
        });
    }
}

// ── Pipeline ───────────────────────────────────────────────────

/// Converts video sources into timelines.
#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    settings: IngestSettings,
    optimize: OptimizeSettings,
}

impl IngestPipeline {
    pub fn new(settings: IngestSettings) -> Self {
        Self {
            settings,
            optimize: OptimizeSettings::default(),
        }
    }

    /// Settings used when `post_optimize_kb` is set.
    pub fn with_optimize_settings(mut self, optimize: OptimizeSettings) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Open `path` with `decoder`, then [`run`](Self::run) the pipeline on it.
    ///
    /// A source that cannot be opened still ends the progress stream with a
    /// `Failed` report.
    pub async fn ingest_path<F>(
        &self,
        decoder: Arc<dyn MediaDecoder>,
        path: PathBuf,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<Timeline, IngestError>
    where
        F: FnMut(IngestProgress) + Send,
    {
        let mut job = ExtractionJob::new(&mut on_progress);
        let display_path = path.display().to_string();
        info!(job = %job.id, path = %display_path, "Opening source");

        let opened = tokio::task::spawn_blocking(move || decoder.open_source(&path))
            .await
            .map_err(|e| DecodeError::Open {
                path: display_path,
                reason: e.to_string(),
            })
            .and_then(|result| result);

        let result = match opened {
            Ok(source) => self.drive(&mut job, source, cancel).await,
            Err(err) => Err(IngestError::from(err)),
        };
        Self::finish(&mut job, result)
    }

    /// Run the full pipeline on an opened source.
    ///
    /// `on_progress` is called on every stage transition and after every
    /// extraction batch, ending with a `Done`, `Cancelled` or `Failed` report.
    pub async fn run<F>(
        &self,
        source: Arc<dyn VideoSource>,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<Timeline, IngestError>
    where
        F: FnMut(IngestProgress) + Send,
    {
        let mut job = ExtractionJob::new(&mut on_progress);
        info!(job = %job.id, "Starting ingest");

        let result = self.drive(&mut job, source, cancel).await;
        Self::finish(&mut job, result)
    }

    fn finish<F: FnMut(IngestProgress)>(
        job: &mut ExtractionJob<'_, F>,
        result: Result<Timeline, IngestError>,
    ) -> Result<Timeline, IngestError> {
        match &result {
            Ok(timeline) => {
                info!(job = %job.id, frames = timeline.len(), "Ingest complete");
            }
            Err(err) if err.is_cancelled() => {
                info!(job = %job.id, "Ingest cancelled");
                job.report(IngestStage::Cancelled, 0.0, err.status_message());
            }
            Err(err) => {
                warn!(job = %job.id, error = %err, "Ingest failed");
                job.report(IngestStage::Failed, 0.0, err.status_message());
            }
        }
        result
    }

    async fn drive<F: FnMut(IngestProgress)>(
        &self,
        job: &mut ExtractionJob<'_, F>,
        source: Arc<dyn VideoSource>,
        cancel: &CancelToken,
    ) -> Result<Timeline, IngestError> {
        // ── Analyzing ──
        job.report(IngestStage::Analyzing, 0.0, IngestStage::Analyzing.display_name());
        if !source.has_video() {
            return Err(IngestError::NoVideoTrack);
        }
        let native_size = source.native_size();
        if native_size.0 == 0 || native_size.1 == 0 {
            return Err(IngestError::NoVideoTrack);
        }
        let duration = source.duration();
        // Written negated so NaN is rejected too; an empty source never qualifies
        if !(duration > 0.0 && duration >= self.settings.min_source_duration) {
            return Err(IngestError::TooShort { duration });
        }
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        // ── Computing settings ──
        job.report(
            IngestStage::ComputingSettings,
            0.0,
            IngestStage::ComputingSettings.display_name(),
        );
        let plan = plan_extraction(
            duration,
            source.native_frame_rate(),
            native_size,
            &self.settings,
        );
        info!(
            job = %job.id,
            duration,
            frame_step = plan.frame_step,
            width = plan.output_size.0,
            height = plan.output_size.1,
            samples = plan.timestamps.len(),
            "Planned extraction"
        );

        // ── Extracting ──
        let decoded = self.extract(job, &source, &plan, cancel).await?;
        if decoded.is_empty() {
            return Err(IngestError::EmptyResult);
        }

        // ── Post-processing ──
        self.post_process(job, decoded, cancel).await
    }

    async fn extract<F: FnMut(IngestProgress)>(
        &self,
        job: &mut ExtractionJob<'_, F>,
        source: &Arc<dyn VideoSource>,
        plan: &ExtractionPlan,
        cancel: &CancelToken,
    ) -> Result<Vec<(f64, FrameImage)>, IngestError> {
        let total = plan.timestamps.len();
        let batch_size = self.settings.batch_size.max(1);
        let mut decoded = Vec::with_capacity(total);
        let mut done = 0usize;
        let mut failed = 0usize;

        job.report(IngestStage::Extracting, 0.0, format!("Extracting 0 of {total} frames"));

        for batch in plan.timestamps.chunks(batch_size) {
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let mut tasks = JoinSet::new();
            for &time in batch {
                let source = Arc::clone(source);
                let size = plan.output_size;
                tasks.spawn_blocking(move || (time, source.decode_frame_at(time, size)));
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((time, Ok(image))) if image.is_consistent() => decoded.push((time, image)),
                    Ok((time, Ok(_))) => {
                        failed += 1;
                        warn!(time, "Skipping frame with inconsistent buffer");
                    }
                    Ok((time, Err(err))) => {
                        failed += 1;
                        warn!(time, error = %err, "Skipping frame that failed to decode");
                    }
                    Err(err) => {
                        failed += 1;
                        warn!(error = %err, "Decode task failed");
                    }
                }
            }

            done += batch.len();
            job.report(
                IngestStage::Extracting,
                done as f64 / total as f64,
                format!("Extracted {done} of {total} frames"),
            );
            tokio::task::yield_now().await;
        }

        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        if failed > 0 {
            warn!(job = %job.id, failed, decoded = decoded.len(), "Some frames were skipped");
        }
        Ok(decoded)
    }

    async fn post_process<F: FnMut(IngestProgress)>(
        &self,
        job: &mut ExtractionJob<'_, F>,
        mut decoded: Vec<(f64, FrameImage)>,
        cancel: &CancelToken,
    ) -> Result<Timeline, IngestError> {
        job.report(IngestStage::PostProcessing, 0.0, "Ordering frames");
        // Batches complete in any order
        decoded.sort_by(|a, b| a.0.total_cmp(&b.0));
        tokio::task::yield_now().await;
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        job.report(IngestStage::PostProcessing, 0.3, "Removing duplicate frames");
        let extracted = decoded.len();
        let unique = dedup::dedup_adjacent(decoded, |(_, image)| image);
        debug!(
            job = %job.id,
            extracted,
            unique = unique.len(),
            "Removed duplicate frames"
        );
        tokio::task::yield_now().await;
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        job.report(IngestStage::PostProcessing, 0.6, "Building timeline");
        let frame_duration = self.settings.output_frame_duration;
        let mut timeline: Timeline = unique
            .into_iter()
            .map(|(_, image)| Frame::new(image, frame_duration))
            .collect();

        if let Some(target_kb) = self.settings.post_optimize_kb {
            job.report(IngestStage::PostProcessing, 0.8, "Optimizing frames");
            aggressive_optimize(&mut timeline, target_kb, &self.optimize);
        }

        job.report(
            IngestStage::Done,
            1.0,
            format!("Imported {} frames", timeline.len()),
        );
        Ok(timeline)
    }
}
