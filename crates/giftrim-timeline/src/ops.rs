//! Frame operations over a timeline.
//!
//! Every operation runs to completion synchronously and never fails:
//! out-of-range or malformed input leaves the timeline unchanged. No
//! operation here empties a non-empty timeline.
//!
//! Two families of frame reduction exist:
//! - *Duration-preserving* ([`remove_similar`], [`remove_static_sequences`],
//!   [`merge_short_frames`], [`reduce_frame_rate`]) hand the time of every
//!   dropped frame to a surviving neighbour, so total playback time is kept.
//! - *Frame-rate thinning* ([`remove_even`], [`remove_odd`],
//!   [`remove_every_nth`]) drop frames together with their time, so playback
//!   gets shorter.

use crate::similarity::is_similar;
use crate::timeline::{clamp_duration, Frame, Timeline};
use giftrim_core::frame::BYTES_PER_PIXEL;
use giftrim_core::timing::BASE_FRAME_DURATION;
use giftrim_core::{FrameImage, PixelRect};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// Slowest speed reported by [`current_speed_multiplier`].
pub const MIN_SPEED_MULTIPLIER: f64 = 0.25;
/// Fastest speed reported by [`current_speed_multiplier`].
pub const MAX_SPEED_MULTIPLIER: f64 = 4.0;

// ── Trimming ────────────────────────────────────────────────────

/// Remove the frame at `index`. No-op when out of range or when it is the last frame.
pub fn delete_frame(timeline: &mut Timeline, index: usize) -> Option<Frame> {
    if index >= timeline.len() || timeline.len() <= 1 {
        debug!(index, len = timeline.len(), "delete_frame ignored");
        return None;
    }
    Some(timeline.frames_mut().remove(index))
}

/// Clamp `range` to the timeline bounds. Returns `None` for an empty result.
pub fn clamp_range(timeline: &Timeline, range: Range<usize>) -> Option<Range<usize>> {
    let end = range.end.min(timeline.len());
    let start = range.start.min(end);
    (start < end).then_some(start..end)
}

/// Remove a range of frames. The range is clamped to the timeline; the call
/// is refused when it would remove every frame.
pub fn delete_range(timeline: &mut Timeline, range: Range<usize>) -> Vec<Frame> {
    let Some(range) = clamp_range(timeline, range) else {
        return Vec::new();
    };
    if range.len() >= timeline.len() {
        debug!(?range, "delete_range refused: would empty the timeline");
        return Vec::new();
    }
    timeline.frames_mut().drain(range).collect()
}

// ── Timing ──────────────────────────────────────────────────────

/// Divide every duration by `multiplier` (2.0 plays twice as fast).
///
/// Non-positive or non-finite multipliers are ignored; results below the
/// duration floor are raised to it.
pub fn adjust_speed(timeline: &mut Timeline, multiplier: f64) {
    if !(multiplier > 0.0) || !multiplier.is_finite() {
        warn!(multiplier, "adjust_speed ignored: multiplier must be positive");
        return;
    }
    for frame in timeline.frames_mut() {
        frame.duration = clamp_duration(frame.duration / multiplier);
    }
}

/// Give every frame the same duration, floored.
pub fn set_all_duration(timeline: &mut Timeline, duration: f64) {
    let duration = clamp_duration(duration);
    for frame in timeline.frames_mut() {
        frame.duration = duration;
    }
}

/// Set one frame's duration, floored. Returns the previous duration.
pub fn set_frame_duration(timeline: &mut Timeline, index: usize, duration: f64) -> Option<f64> {
    let frame = timeline.frames_mut().get_mut(index)?;
    let previous = frame.duration;
    frame.duration = clamp_duration(duration);
    Some(previous)
}

/// Playback speed relative to the base rate, derived from the mean frame duration.
///
/// Clamped to [`MIN_SPEED_MULTIPLIER`]..=[`MAX_SPEED_MULTIPLIER`]; an empty
/// timeline reports 1.0.
pub fn current_speed_multiplier(timeline: &Timeline) -> f64 {
    match timeline.mean_duration() {
        Some(mean) if mean > 0.0 => {
            (BASE_FRAME_DURATION / mean).clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER)
        }
        _ => 1.0,
    }
}

// ── Ordering ────────────────────────────────────────────────────

/// Reverse playback order. Durations travel with their frames.
pub fn reverse(timeline: &mut Timeline) {
    timeline.frames_mut().reverse();
}

/// Append the reversed sequence without its first element, producing a
/// ping-pong loop that does not show the turning frame twice.
pub fn yoyo(timeline: &mut Timeline) {
    if timeline.len() < 2 {
        return;
    }
    let tail: Vec<Frame> = timeline.frames().iter().rev().skip(1).cloned().collect();
    timeline.frames_mut().extend(tail);
}

/// Move the frame at `from` so that it ends up at index `to`.
pub fn move_frame(timeline: &mut Timeline, from: usize, to: usize) -> bool {
    let len = timeline.len();
    if from >= len || to >= len || from == to {
        return false;
    }
    let frame = timeline.frames_mut().remove(from);
    timeline.frames_mut().insert(to, frame);
    true
}

/// Insert a copy of frame `index` directly after it.
pub fn duplicate_frame(timeline: &mut Timeline, index: usize) -> bool {
    let Some(frame) = timeline.get(index).cloned() else {
        return false;
    };
    timeline.frames_mut().insert(index + 1, frame);
    true
}

// ── Frame-rate thinning ─────────────────────────────────────────

fn keep_positions(timeline: &mut Timeline, keep: impl Fn(usize) -> bool) {
    let kept: Vec<Frame> = timeline
        .frames()
        .iter()
        .enumerate()
        .filter(|(i, _)| keep(*i))
        .map(|(_, f)| f.clone())
        .collect();
    if kept.is_empty() {
        debug!("frame thinning ignored: would empty the timeline");
        return;
    }
    timeline.replace_frames(kept);
}

/// Remove the 2nd, 4th, 6th… frames, keeping zero-based even positions.
///
/// Dropped durations are discarded, so playback gets shorter.
pub fn remove_even(timeline: &mut Timeline) {
    keep_positions(timeline, |i| i % 2 == 0);
}

/// Remove the 1st, 3rd, 5th… frames, keeping zero-based odd positions.
///
/// Dropped durations are discarded. A single-frame timeline is left alone.
pub fn remove_odd(timeline: &mut Timeline) {
    keep_positions(timeline, |i| i % 2 == 1);
}

/// Remove every `n`th frame (positions where `(i + 1) % n == 0`). No-op if `n <= 1`.
pub fn remove_every_nth(timeline: &mut Timeline, n: usize) {
    if n <= 1 {
        return;
    }
    keep_positions(timeline, |i| (i + 1) % n != 0);
}

// ── Duration-preserving reduction ───────────────────────────────

/// Fold each frame into the last kept frame while the two are within `threshold`.
fn collapse_similar(timeline: &mut Timeline, threshold: f64) -> usize {
    if timeline.len() < 2 {
        return 0;
    }
    let frames = std::mem::take(timeline.frames_mut());
    let before = frames.len();
    let mut kept: Vec<Frame> = Vec::with_capacity(before);

    for frame in frames {
        match kept.last_mut() {
            Some(anchor) if is_similar(&anchor.image, &frame.image, threshold) => {
                anchor.duration += frame.duration;
            }
            _ => kept.push(frame),
        }
    }

    let removed = before - kept.len();
    timeline.replace_frames(kept);
    removed
}

/// Merge frames whose sampled content is within `threshold` of the
/// preceding kept frame, adding their duration to it.
pub fn remove_similar(timeline: &mut Timeline, threshold: f64) {
    let removed = collapse_similar(timeline, threshold);
    debug!(removed, threshold, "remove_similar");
}

/// Collapse runs of near-static content into the run's first frame.
///
/// Same accumulation as [`remove_similar`]; callers pass a tighter
/// threshold so only genuinely unchanged content is folded.
pub fn remove_static_sequences(timeline: &mut Timeline, threshold: f64) {
    let removed = collapse_similar(timeline, threshold);
    debug!(removed, threshold, "remove_static_sequences");
}

/// Batch consecutive frames shorter than `min_duration` into one frame that
/// shows the first batched image for the summed duration.
///
/// A batch is flushed when a frame of at least `min_duration` arrives or the
/// timeline ends.
pub fn merge_short_frames(timeline: &mut Timeline, min_duration: f64) {
    if timeline.len() < 2 {
        return;
    }
    let frames = std::mem::take(timeline.frames_mut());
    let mut merged: Vec<Frame> = Vec::with_capacity(frames.len());
    let mut batch: Option<Frame> = None;

    for frame in frames {
        if frame.duration < min_duration {
            match batch.as_mut() {
                Some(pending) => pending.duration += frame.duration,
                None => batch = Some(frame),
            }
        } else {
            merged.extend(batch.take());
            merged.push(frame);
        }
    }
    merged.extend(batch.take());

    timeline.replace_frames(merged);
}

/// Keep every `k`th frame where `k = ceil(1 / target_ratio)`, adding the
/// durations of the skipped frames that follow it.
///
/// No-op when `target_ratio >= 1`, `target_ratio <= 0`, or fewer than 3 frames.
pub fn reduce_frame_rate(timeline: &mut Timeline, target_ratio: f64) {
    if !(target_ratio > 0.0 && target_ratio < 1.0) || timeline.len() < 3 {
        return;
    }
    let stride = (1.0 / target_ratio).ceil() as usize;
    let frames = std::mem::take(timeline.frames_mut());
    let reduced: Vec<Frame> = frames
        .chunks(stride)
        .map(|chunk| {
            let mut kept = chunk[0].clone();
            kept.duration = chunk.iter().map(|f| f.duration).sum();
            kept
        })
        .collect();
    debug!(stride, before = frames.len(), after = reduced.len(), "reduce_frame_rate");
    timeline.replace_frames(reduced);
}

// ── Geometry ────────────────────────────────────────────────────

fn crop_image(image: &FrameImage, rect: PixelRect) -> Option<FrameImage> {
    if !image.is_consistent() || !rect.fits_within(image.width, image.height) {
        return None;
    }
    let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
    let mut data = Vec::with_capacity(row_bytes * rect.height as usize);
    for y in rect.y..rect.y + rect.height {
        let start = rect.x as usize * BYTES_PER_PIXEL;
        data.extend_from_slice(&image.row(y)[start..start + row_bytes]);
    }
    FrameImage::from_rgba(rect.width, rect.height, data).ok()
}

/// Crop every frame to `rect`. Frames the rect does not fit are dropped; if
/// no frame can be cropped the timeline is left unchanged.
pub fn crop(timeline: &mut Timeline, rect: PixelRect) {
    if rect.is_empty() || timeline.is_empty() {
        return;
    }
    let cropped: Vec<Frame> = timeline
        .frames()
        .iter()
        .filter_map(|frame| {
            let image = crop_image(&frame.image, rect)?;
            Some(Frame::new(image, frame.duration))
        })
        .collect();

    if cropped.is_empty() {
        warn!(?rect, "crop ignored: rect fits no frame");
        return;
    }
    if cropped.len() < timeline.len() {
        warn!(dropped = timeline.len() - cropped.len(), "crop dropped frames");
    }
    timeline.replace_frames(cropped);
}

fn scale_image(image: &FrameImage, width: u32, height: u32) -> Option<FrameImage> {
    let source = RgbaImage::from_raw(image.width, image.height, image.data.clone())?;
    let scaled = imageops::resize(&source, width, height, FilterType::Triangle);
    FrameImage::from_rgba(width, height, scaled.into_raw()).ok()
}

/// Scale every frame down so the first frame is at most `max_width` wide,
/// preserving aspect ratio. No-op when it already fits.
///
/// A frame that cannot be scaled is kept at its original size.
pub fn resize(timeline: &mut Timeline, max_width: u32) {
    let Some((width, _)) = timeline.dimensions() else {
        return;
    };
    if max_width == 0 || width <= max_width {
        return;
    }
    let scale = max_width as f64 / width as f64;

    for frame in timeline.frames_mut() {
        let new_width = ((frame.width() as f64 * scale).round() as u32).max(1);
        let new_height = ((frame.height() as f64 * scale).round() as u32).max(1);
        match scale_image(&frame.image, new_width, new_height) {
            Some(scaled) => frame.image = Arc::new(scaled),
            None => warn!(
                width = frame.width(),
                height = frame.height(),
                "resize failed for frame, keeping original"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftrim_core::timing::MIN_FRAME_DURATION;
    use proptest::prelude::*;

    fn gray(level: u8) -> FrameImage {
        FrameImage::solid(16, 16, [level, level, level])
    }

    fn timeline_of(levels_and_durations: &[(u8, f64)]) -> Timeline {
        levels_and_durations
            .iter()
            .map(|&(level, d)| Frame::new(gray(level), d))
            .collect()
    }

    fn uniform(count: usize, duration: f64) -> Timeline {
        (0..count)
            .map(|i| Frame::new(gray((i * 40 % 256) as u8), duration))
            .collect()
    }

    fn durations(timeline: &Timeline) -> Vec<f64> {
        timeline.iter().map(|f| f.duration).collect()
    }

    fn levels(timeline: &Timeline) -> Vec<u8> {
        timeline.iter().map(|f| f.image.data[0]).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_delete_frame() {
        let mut tl = uniform(3, 0.1);
        assert!(delete_frame(&mut tl, 1).is_some());
        assert_eq!(tl.len(), 2);
        assert!(delete_frame(&mut tl, 5).is_none());
        assert_eq!(tl.len(), 2);
    }

    #[test]
    fn test_delete_frame_keeps_last_frame() {
        let mut tl = uniform(1, 0.1);
        assert!(delete_frame(&mut tl, 0).is_none());
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn test_delete_range_clamps() {
        let mut tl = uniform(5, 0.1);
        let removed = delete_range(&mut tl, 3..100);
        assert_eq!(removed.len(), 2);
        assert_eq!(tl.len(), 3);
    }

    #[test]
    fn test_delete_range_refuses_to_empty() {
        let mut tl = uniform(4, 0.1);
        assert!(delete_range(&mut tl, 0..4).is_empty());
        assert!(delete_range(&mut tl, 0..usize::MAX).is_empty());
        assert_eq!(tl.len(), 4);
    }

    #[test]
    fn test_delete_range_inverted_is_noop() {
        let mut tl = uniform(4, 0.1);
        #[allow(clippy::reversed_empty_ranges)]
        let removed = delete_range(&mut tl, 3..1);
        assert!(removed.is_empty());
        assert_eq!(tl.len(), 4);
    }

    #[test]
    fn test_adjust_speed() {
        let mut tl = uniform(3, 0.1);
        adjust_speed(&mut tl, 2.0);
        assert!(durations(&tl).iter().all(|&d| (d - 0.05).abs() < 1e-12));
        adjust_speed(&mut tl, 1000.0);
        assert!(durations(&tl).iter().all(|&d| d == MIN_FRAME_DURATION));
    }

    #[test]
    fn test_adjust_speed_rejects_bad_multiplier() {
        let mut tl = uniform(3, 0.1);
        adjust_speed(&mut tl, 0.0);
        adjust_speed(&mut tl, -1.0);
        adjust_speed(&mut tl, f64::NAN);
        assert_eq!(durations(&tl), vec![0.1; 3]);
    }

    #[test]
    fn test_set_all_duration_floor() {
        let mut tl = uniform(3, 0.1);
        set_all_duration(&mut tl, -5.0);
        assert_eq!(durations(&tl), vec![MIN_FRAME_DURATION; 3]);
        set_all_duration(&mut tl, 0.5);
        assert_eq!(durations(&tl), vec![0.5; 3]);
    }

    #[test]
    fn test_current_speed_multiplier() {
        assert!((current_speed_multiplier(&uniform(4, 1.0 / 15.0)) - 1.0).abs() < 1e-4);
        assert_eq!(current_speed_multiplier(&uniform(4, 10.0)), 0.25);
        assert_eq!(current_speed_multiplier(&uniform(4, 0.001)), 4.0);
        assert_eq!(current_speed_multiplier(&Timeline::new()), 1.0);
    }

    #[test]
    fn test_reverse() {
        let mut tl = timeline_of(&[(0, 0.1), (50, 0.2), (100, 0.3)]);
        reverse(&mut tl);
        assert_eq!(levels(&tl), vec![100, 50, 0]);
        assert_eq!(durations(&tl), vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_yoyo_skips_turning_frame() {
        let mut tl = timeline_of(&[(0, 0.1), (50, 0.1), (100, 0.1)]);
        yoyo(&mut tl);
        assert_eq!(levels(&tl), vec![0, 50, 100, 50, 0]);
    }

    #[test]
    fn test_yoyo_single_frame_noop() {
        let mut tl = uniform(1, 0.1);
        yoyo(&mut tl);
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn test_move_and_duplicate() {
        let mut tl = timeline_of(&[(0, 0.1), (50, 0.1), (100, 0.1)]);
        assert!(move_frame(&mut tl, 0, 2));
        assert_eq!(levels(&tl), vec![50, 100, 0]);
        assert!(!move_frame(&mut tl, 0, 3));
        assert!(duplicate_frame(&mut tl, 1));
        assert_eq!(levels(&tl), vec![50, 100, 100, 0]);
        assert!(!duplicate_frame(&mut tl, 9));
    }

    #[test]
    fn test_remove_even_and_odd() {
        let mut tl = timeline_of(&[(0, 0.1), (10, 0.1), (20, 0.1), (30, 0.1), (40, 0.1)]);
        remove_even(&mut tl);
        assert_eq!(levels(&tl), vec![0, 20, 40]);

        let mut tl = timeline_of(&[(0, 0.1), (10, 0.1), (20, 0.1), (30, 0.1), (40, 0.1)]);
        remove_odd(&mut tl);
        assert_eq!(levels(&tl), vec![10, 30]);
        // Thinning drops time
        assert_close(tl.total_duration(), 0.2);
    }

    #[test]
    fn test_remove_odd_single_frame_noop() {
        let mut tl = uniform(1, 0.1);
        remove_odd(&mut tl);
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn test_remove_every_nth() {
        let mut tl = timeline_of(&[(0, 0.1), (10, 0.1), (20, 0.1), (30, 0.1), (40, 0.1), (50, 0.1)]);
        remove_every_nth(&mut tl, 3);
        assert_eq!(levels(&tl), vec![0, 10, 30, 40]);

        let mut tl = uniform(4, 0.1);
        remove_every_nth(&mut tl, 1);
        assert_eq!(tl.len(), 4);
    }

    #[test]
    fn test_remove_similar_merges_durations() {
        let mut tl = timeline_of(&[(0, 0.1), (1, 0.1), (2, 0.1), (200, 0.1), (201, 0.1)]);
        remove_similar(&mut tl, 0.02);
        assert_eq!(levels(&tl), vec![0, 200]);
        assert_close(tl.get(0).unwrap().duration, 0.3);
        assert_close(tl.get(1).unwrap().duration, 0.2);
    }

    #[test]
    fn test_remove_similar_compares_against_kept_frame() {
        // Each step is small but the drift from the anchor accumulates
        let mut tl = timeline_of(&[(0, 0.1), (3, 0.1), (6, 0.1), (9, 0.1)]);
        remove_similar(&mut tl, 0.02);
        // 3/255 merges; 6/255 ≈ 0.0235 starts a new anchor that absorbs 9
        assert_eq!(levels(&tl), vec![0, 6]);
        assert_close(tl.total_duration(), 0.4);
    }

    #[test]
    fn test_remove_similar_keeps_distinct_video_frames() {
        let mut tl: Timeline = [[0, 0, 0], [0, 255, 0], [0, 0, 0]]
            .into_iter()
            .map(|rgb| Frame::new(FrameImage::solid(640, 480, rgb), 0.1))
            .collect();
        remove_similar(&mut tl, 0.02);
        assert_eq!(tl.len(), 3);
    }

    #[test]
    fn test_remove_static_sequences_is_tighter() {
        let mut tl = timeline_of(&[(0, 0.1), (2, 0.1), (0, 0.1), (0, 0.1)]);
        remove_static_sequences(&mut tl, 0.0);
        assert_eq!(levels(&tl), vec![0, 2, 0]);
        assert_close(tl.total_duration(), 0.4);
    }

    #[test]
    fn test_merge_short_frames_example() {
        let mut tl = timeline_of(&[(0, 0.02), (50, 0.03), (100, 0.02), (150, 0.08), (200, 0.01)]);
        merge_short_frames(&mut tl, 0.05);
        assert_eq!(tl.len(), 3);
        let d = durations(&tl);
        assert_close(d[0], 0.07);
        assert_close(d[1], 0.08);
        assert_close(d[2], 0.01);
        assert_eq!(levels(&tl), vec![0, 150, 200]);
    }

    #[test]
    fn test_reduce_frame_rate() {
        let mut tl = timeline_of(&[(0, 0.1), (10, 0.1), (20, 0.1), (30, 0.1), (40, 0.1)]);
        reduce_frame_rate(&mut tl, 0.5);
        assert_eq!(levels(&tl), vec![0, 20, 40]);
        let d = durations(&tl);
        assert_close(d[0], 0.2);
        assert_close(d[1], 0.2);
        assert_close(d[2], 0.1);
    }

    #[test]
    fn test_reduce_frame_rate_noops() {
        let mut tl = uniform(5, 0.1);
        reduce_frame_rate(&mut tl, 1.0);
        reduce_frame_rate(&mut tl, 0.0);
        assert_eq!(tl.len(), 5);
        let mut short = uniform(2, 0.1);
        reduce_frame_rate(&mut short, 0.5);
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_crop() {
        let mut tl = Timeline::from_frames(vec![
            Frame::new(FrameImage::test_pattern(16, 8), 0.1),
            Frame::new(FrameImage::test_pattern(16, 8), 0.2),
        ]);
        crop(&mut tl, PixelRect::new(14, 0, 2, 4));
        assert_eq!(tl.dimensions(), Some((2, 4)));
        assert_eq!(tl.get(0).unwrap().image.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(durations(&tl), vec![0.1, 0.2]);
    }

    #[test]
    fn test_crop_drops_frames_that_do_not_fit() {
        let mut tl = Timeline::from_frames(vec![
            Frame::new(FrameImage::new(16, 16), 0.1),
            Frame::new(FrameImage::new(4, 4), 0.1),
        ]);
        crop(&mut tl, PixelRect::new(0, 0, 8, 8));
        assert_eq!(tl.len(), 1);

        let mut tl = uniform(2, 0.1);
        crop(&mut tl, PixelRect::new(0, 0, 100, 100));
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.dimensions(), Some((16, 16)));
    }

    #[test]
    fn test_resize() {
        let mut tl = Timeline::from_frames(vec![Frame::new(FrameImage::new(200, 100), 0.1)]);
        resize(&mut tl, 50);
        assert_eq!(tl.dimensions(), Some((50, 25)));

        resize(&mut tl, 80);
        assert_eq!(tl.dimensions(), Some((50, 25)));
    }

    #[test]
    fn test_resize_keeps_unscalable_frame() {
        let broken = FrameImage {
            width: 200,
            height: 100,
            data: vec![0; 10],
        };
        let mut tl = Timeline::from_frames(vec![
            Frame::new(FrameImage::new(200, 100), 0.1),
            Frame::new(broken, 0.1),
        ]);
        resize(&mut tl, 100);
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.get(0).unwrap().width(), 100);
        assert_eq!(tl.get(1).unwrap().width(), 200);
    }

    fn arb_timeline() -> impl Strategy<Value = Timeline> {
        prop::collection::vec((any::<u8>(), 0.001f64..2.0), 1..40).prop_map(|pairs| {
            pairs.into_iter()
                .map(|(level, d)| Frame::new(FrameImage::solid(8, 8, [level, level / 2, 0]), d))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_reductions_preserve_total_duration(
            tl in arb_timeline(),
            threshold in 0.0f64..0.5,
            min_duration in 0.0f64..1.0,
            ratio in 0.01f64..1.5,
        ) {
            let total = tl.total_duration();
            let tolerance = 1e-9 * tl.len() as f64;

            let mut similar = tl.clone();
            remove_similar(&mut similar, threshold);
            prop_assert!((similar.total_duration() - total).abs() < tolerance);

            let mut stat = tl.clone();
            remove_static_sequences(&mut stat, threshold / 4.0);
            prop_assert!((stat.total_duration() - total).abs() < tolerance);

            let mut merged = tl.clone();
            merge_short_frames(&mut merged, min_duration);
            prop_assert!((merged.total_duration() - total).abs() < tolerance);

            let mut reduced = tl.clone();
            reduce_frame_rate(&mut reduced, ratio);
            prop_assert!((reduced.total_duration() - total).abs() < tolerance);
            prop_assert!(!reduced.is_empty());
        }

        #[test]
        fn prop_retiming_respects_floor(tl in arb_timeline(), value in -10.0f64..10.0) {
            let mut sped = tl.clone();
            adjust_speed(&mut sped, value);
            prop_assert!(sped.iter().all(|f| f.duration >= MIN_FRAME_DURATION));

            let mut set = tl;
            set_all_duration(&mut set, value);
            prop_assert!(set.iter().all(|f| f.duration >= MIN_FRAME_DURATION));
        }

        #[test]
        fn prop_deletes_never_empty(tl in arb_timeline(), start in 0usize..50, len in 0usize..50) {
            let mut t = tl.clone();
            delete_range(&mut t, start..start + len);
            prop_assert!(!t.is_empty());

            let mut t = tl;
            delete_frame(&mut t, start);
            prop_assert!(!t.is_empty());
        }
    }
}
