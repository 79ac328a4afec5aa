//! Adjacent-duplicate removal for freshly extracted frames.
//!
//! Uses a coarse grid probe rather than the timeline's pixel-sampled
//! similarity: decoder noise on static scenes should not count as motion.

use giftrim_core::FrameImage;

/// Sample points per axis.
pub const GRID_SIZE: u32 = 32;

/// Per-channel delta above which a sampled pixel counts as changed.
pub const CHANNEL_DELTA_THRESHOLD: u8 = 30;

/// Fraction of sampled pixels that may change before frames are distinct.
pub const MAX_CHANGED_FRACTION: f64 = 0.10;

/// Whether `a` and `b` are visually distinct.
///
/// Frames of different size are always distinct.
pub fn frames_differ(a: &FrameImage, b: &FrameImage) -> bool {
    if a.width != b.width || a.height != b.height {
        return true;
    }
    if a.width == 0 || a.height == 0 {
        return false;
    }

    let cols = GRID_SIZE.min(a.width);
    let rows = GRID_SIZE.min(a.height);
    let mut changed = 0u32;

    for gy in 0..rows {
        let y = (gy * 2 + 1) * a.height / (rows * 2);
        for gx in 0..cols {
            let x = (gx * 2 + 1) * a.width / (cols * 2);
            let (Some(pa), Some(pb)) = (a.pixel(x, y), b.pixel(x, y)) else {
                continue;
            };
            if pa
                .iter()
                .zip(pb.iter())
                .take(3)
                .any(|(ca, cb)| ca.abs_diff(*cb) > CHANNEL_DELTA_THRESHOLD)
            {
                changed += 1;
            }
        }
    }

    f64::from(changed) / f64::from(cols * rows) > MAX_CHANGED_FRACTION
}

/// Drop frames identical to the last kept one, keeping order.
pub fn dedup_adjacent<T>(frames: Vec<T>, image: impl Fn(&T) -> &FrameImage) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(frames.len());
    for frame in frames {
        match kept.last() {
            Some(last) if !frames_differ(image(last), image(&frame)) => {}
            _ => kept.push(frame),
        }
    }
    kept
}
