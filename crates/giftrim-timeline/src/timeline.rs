//! Timeline data model.
//!
//! A timeline is the ordered list of frames making up an animation.
//! Insertion order is playback order, and every duration is kept at or
//! above [`MIN_FRAME_DURATION`].

use giftrim_core::timing::MIN_FRAME_DURATION;
use giftrim_core::{FrameImage, SharedFrameImage};
use std::sync::Arc;

/// Bookkeeping bytes charged per frame on top of its pixel data.
pub const FRAME_OVERHEAD_BYTES: usize = std::mem::size_of::<Frame>();

/// Clamp a duration to the frame floor. NaN and negative values map to the floor.
#[inline]
pub fn clamp_duration(duration: f64) -> f64 {
    if duration >= MIN_FRAME_DURATION {
        duration
    } else {
        MIN_FRAME_DURATION
    }
}

/// One frame of the animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Pixel content. Shared read-only with undo snapshots.
    pub image: SharedFrameImage,
    /// Display time in seconds.
    pub duration: f64,
}

impl Frame {
    /// Create a frame, applying the duration floor.
    pub fn new(image: FrameImage, duration: f64) -> Self {
        Self::from_shared(Arc::new(image), duration)
    }

    /// Create a frame around an already shared image.
    pub fn from_shared(image: SharedFrameImage, duration: f64) -> Self {
        Self {
            image,
            duration: clamp_duration(duration),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Bytes accounted to this frame.
    pub fn memory_size(&self) -> usize {
        self.image.memory_size() + FRAME_OVERHEAD_BYTES
    }
}

/// Ordered sequence of frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    frames: Vec<Frame>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from frames, flooring any short durations.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let mut timeline = Self { frames };
        for frame in &mut timeline.frames {
            frame.duration = clamp_duration(frame.duration);
        }
        timeline
    }

    /// Consume the timeline and return its frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// All frames in playback order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Mutable access for operations in this crate. Callers must keep durations floored.
    #[inline]
    pub(crate) fn frames_mut(&mut self) -> &mut Vec<Frame> {
        &mut self.frames
    }

    /// Replace the frame list wholesale.
    pub(crate) fn replace_frames(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Append a frame at the end.
    pub fn push(&mut self, mut frame: Frame) {
        frame.duration = clamp_duration(frame.duration);
        self.frames.push(frame);
    }

    /// Insert a frame, clamping `index` to the end of the timeline.
    pub fn insert(&mut self, index: usize, mut frame: Frame) {
        frame.duration = clamp_duration(frame.duration);
        let index = index.min(self.frames.len());
        self.frames.insert(index, frame);
    }

    /// Sum of all frame durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Mean frame duration, or `None` for an empty timeline.
    pub fn mean_duration(&self) -> Option<f64> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.total_duration() / self.frames.len() as f64)
        }
    }

    /// Playback time at which frame `index` starts.
    pub fn start_time(&self, index: usize) -> Option<f64> {
        if index >= self.frames.len() {
            return None;
        }
        Some(self.frames[..index].iter().map(|f| f.duration).sum())
    }

    /// Index of the frame showing at playback time `time`.
    pub fn index_at_time(&self, time: f64) -> Option<usize> {
        if self.frames.is_empty() || time < 0.0 {
            return None;
        }
        let mut elapsed = 0.0;
        for (i, frame) in self.frames.iter().enumerate() {
            elapsed += frame.duration;
            if time < elapsed {
                return Some(i);
            }
        }
        Some(self.frames.len() - 1)
    }

    /// Dimensions of the first frame.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width(), f.height()))
    }

    /// Bytes accounted to all frames.
    pub fn memory_size(&self) -> usize {
        self.frames.iter().map(Frame::memory_size).sum()
    }
}

impl FromIterator<Frame> for Timeline {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::from_frames(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
