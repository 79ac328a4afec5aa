//! Decoder capability used by the ingest pipeline.
//!
//! A [`VideoSource`] answers metadata queries and decodes a single frame at a
//! timestamp. Implementations must tolerate concurrent `decode_frame_at`
//! calls; the pipeline fans a batch of timestamps out across blocking tasks.

use crate::error::DecodeError;
use giftrim_core::FrameImage;
use std::path::Path;
use std::sync::Arc;

/// An opened video that can be sampled at arbitrary timestamps.
pub trait VideoSource: Send + Sync {
    /// Whether the source carries a decodable video track.
    fn has_video(&self) -> bool {
        true
    }

    /// Duration in seconds.
    fn duration(&self) -> f64;

    /// Native frame rate in frames per second.
    fn native_frame_rate(&self) -> f64;

    /// Native pixel dimensions.
    fn native_size(&self) -> (u32, u32);

    /// Decode the frame nearest `time`, scaled to `output_size`.
    fn decode_frame_at(&self, time: f64, output_size: (u32, u32))
        -> Result<FrameImage, DecodeError>;
}

/// Opens sources from files.
pub trait MediaDecoder: Send + Sync {
    fn open_source(&self, path: &Path) -> Result<Arc<dyn VideoSource>, DecodeError>;
}

// ── Pattern source ─────────────────────────────────────────────

/// Synthetic source rendering color bars with a moving white block.
///
/// Useful for demos and for exercising the pipeline without media files.
/// After `still_after` seconds the block stops, so the remaining frames are
/// identical.
#[derive(Debug, Clone)]
pub struct PatternSource {
    pub duration: f64,
    pub frame_rate: f64,
    pub size: (u32, u32),
    pub still_after: Option<f64>,
}

impl PatternSource {
    pub fn new(duration: f64, frame_rate: f64, size: (u32, u32)) -> Self {
        Self {
            duration,
            frame_rate,
            size,
            still_after: None,
        }
    }

    pub fn with_still_after(mut self, seconds: f64) -> Self {
        self.still_after = Some(seconds);
        self
    }
}

impl VideoSource for PatternSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn native_frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn decode_frame_at(
        &self,
        time: f64,
        (width, height): (u32, u32),
    ) -> Result<FrameImage, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::Frame {
                time,
                reason: "zero output size".into(),
            });
        }
        if !(0.0..=self.duration).contains(&time) {
            return Err(DecodeError::Frame {
                time,
                reason: "timestamp outside source".into(),
            });
        }

        let t = self.still_after.map_or(time, |still| time.min(still));
        let mut image = FrameImage::test_pattern(width, height);

        // Block sweeps the full width once per second
        let block = (width / 4).max(1);
        let travel = width.saturating_sub(block).max(1) as f64;
        let left = ((t.fract() * travel) as u32).min(width.saturating_sub(block));
        for y in 0..height / 2 {
            for x in left..left + block {
                image.set_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        // Lower half steps 64 levels every 1/15 s so sampled frames differ
        let level = ((t * 960.0) as u64 % 256) as u8;
        for y in height / 2..height {
            for x in 0..width {
                image.set_pixel(x, y, [level, 255 - level, 128, 255]);
            }
        }
        Ok(image)
    }
}
