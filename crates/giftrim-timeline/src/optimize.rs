//! Size-targeted optimization.
//!
//! Chains the duration-preserving reductions in a fixed order and falls back
//! to frame-rate reduction until the estimated output size fits the target.

use crate::ops;
use crate::timeline::Timeline;
use giftrim_core::OptimizeSettings;
use serde::Serialize;
use tracing::info;

/// Planning estimate of encoded bytes per pixel per frame.
pub const ESTIMATED_BYTES_PER_PIXEL: f64 = 0.5;

/// Timelines with this many frames or fewer are left alone.
pub const MIN_FRAMES_TO_OPTIMIZE: usize = 5;

/// Targets below this size (KB) always shed frames.
pub const STRICT_TARGET_KB: u64 = 1000;

/// Bounds of the ratio handed to frame-rate reduction.
pub const MIN_REDUCTION_RATIO: f64 = 0.05;
pub const MAX_REDUCTION_RATIO: f64 = 0.95;

/// Ratio used when a strict target forces one more reduction.
pub const FORCED_REDUCTION_RATIO: f64 = 0.5;

/// Heuristic encoded size in bytes: first-frame pixels × bytes-per-pixel × frame count.
///
/// A planning signal only; the real size depends on the encoder.
pub fn estimate_size(timeline: &Timeline) -> u64 {
    let Some(first) = timeline.get(0) else {
        return 0;
    };
    let pixels = first.image.pixel_count() as f64;
    (pixels * ESTIMATED_BYTES_PER_PIXEL * timeline.len() as f64).round() as u64
}

/// Summary of an optimization pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeReport {
    pub frames_before: usize,
    pub frames_after: usize,
    pub estimated_bytes_before: u64,
    pub estimated_bytes_after: u64,
    /// Ratio passed to frame-rate reduction, if it ran.
    pub reduction_ratio: Option<f64>,
    /// Whether the strict-target fallback halved the frame rate.
    pub forced_reduction: bool,
}

/// Shrink `timeline` toward `target_size_kb`.
///
/// Order: similar-frame removal, static-run compaction, short-frame merging,
/// then frame-rate reduction by `clamp(target / estimate)` if still too big.
/// When none of that removed a frame and the target is strict, the frame rate
/// is halved once more so aggressive targets always make progress. Timelines
/// of [`MIN_FRAMES_TO_OPTIMIZE`] frames or fewer are untouched.
pub fn aggressive_optimize(
    timeline: &mut Timeline,
    target_size_kb: u64,
    settings: &OptimizeSettings,
) -> OptimizeReport {
    let frames_before = timeline.len();
    let estimated_bytes_before = estimate_size(timeline);
    let mut report = OptimizeReport {
        frames_before,
        frames_after: frames_before,
        estimated_bytes_before,
        estimated_bytes_after: estimated_bytes_before,
        reduction_ratio: None,
        forced_reduction: false,
    };

    if frames_before <= MIN_FRAMES_TO_OPTIMIZE {
        return report;
    }

    let target_bytes = target_size_kb.saturating_mul(1024);

    ops::remove_similar(timeline, settings.similarity_threshold);
    ops::remove_static_sequences(timeline, settings.static_threshold);
    ops::merge_short_frames(timeline, settings.min_frame_duration);

    let estimate = estimate_size(timeline);
    if estimate > target_bytes {
        let ratio =
            (target_bytes as f64 / estimate as f64).clamp(MIN_REDUCTION_RATIO, MAX_REDUCTION_RATIO);
        ops::reduce_frame_rate(timeline, ratio);
        report.reduction_ratio = Some(ratio);
    }

    if timeline.len() == frames_before && target_size_kb < STRICT_TARGET_KB {
        ops::reduce_frame_rate(timeline, FORCED_REDUCTION_RATIO);
        report.forced_reduction = true;
    }

    report.frames_after = timeline.len();
    report.estimated_bytes_after = estimate_size(timeline);

    info!(
        frames_before,
        frames_after = report.frames_after,
        estimated_kb = report.estimated_bytes_after / 1024,
        target_size_kb,
        "Optimized timeline"
    );
    report
}
