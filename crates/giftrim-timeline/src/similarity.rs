//! Sampled frame-to-frame pixel differencing.
//!
//! Comparing every pixel of two frames is too slow for long timelines, so
//! frames are compared on a fixed number of pixels spread evenly across the
//! whole image. Each sampled pixel contributes its three colour channels;
//! alpha is ignored.

use giftrim_core::frame::BYTES_PER_PIXEL;
use giftrim_core::FrameImage;

/// Number of pixels sampled per comparison.
pub const SAMPLE_COUNT: usize = 1000;

const COLOR_CHANNELS: usize = 3;

/// Mean absolute RGB difference of two images over up to [`SAMPLE_COUNT`]
/// evenly spaced pixels.
///
/// Returns a value in `[0.0, 1.0]` where 0 = identical, 1 = maximum difference.
/// Returns `None` when the images have different dimensions, no pixels, or a
/// buffer that does not match the declared dimensions.
pub fn sampled_difference(a: &FrameImage, b: &FrameImage) -> Option<f64> {
    if a.width != b.width || a.height != b.height {
        return None;
    }
    if !a.is_consistent() || !b.is_consistent() {
        return None;
    }

    let pixel_count = a.pixel_count();
    if pixel_count == 0 {
        return None;
    }

    let samples = pixel_count.min(SAMPLE_COUNT);
    let mut total: u64 = 0;

    for i in 0..samples {
        // Spread across the full image so the bottom rows are reached too
        let pixel = (i as u64 * pixel_count as u64 / samples as u64) as usize;
        let offset = pixel * BYTES_PER_PIXEL;
        let pa = &a.data[offset..offset + COLOR_CHANNELS];
        let pb = &b.data[offset..offset + COLOR_CHANNELS];
        total += pa
            .iter()
            .zip(pb)
            .map(|(x, y)| x.abs_diff(*y) as u64)
            .sum::<u64>();
    }

    Some(total as f64 / ((samples * COLOR_CHANNELS) as f64 * 255.0))
}

/// Whether two images differ by no more than `threshold` (a fraction in `[0, 1]`).
///
/// Images that cannot be compared are never similar.
#[inline]
pub fn is_similar(a: &FrameImage, b: &FrameImage, threshold: f64) -> bool {
    sampled_difference(a, b).is_some_and(|diff| diff <= threshold)
}
