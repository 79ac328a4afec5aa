//! GifTrim Core - Foundation types for animated-image editing
//!
//! This crate provides the fundamental types used throughout GifTrim:
//! - RGBA frame images
//! - Pixel-space geometry
//! - The shared error type
//! - Editor settings

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;

pub use config::{EditorSettings, EncodeSettings, HistorySettings, IngestSettings, OptimizeSettings};
pub use error::{GifTrimError, Result};
pub use frame::{FrameImage, SharedFrameImage};
pub use geometry::{PixelRect, Point};

/// Timing constants shared by the timeline and ingest crates.
pub mod timing {
    /// Smallest duration any frame may carry, in seconds.
    pub const MIN_FRAME_DURATION: f64 = 0.01;

    /// Playback rate that durations are normalized to after ingest.
    pub const BASE_FPS: f64 = 15.0;

    /// Duration of one frame at [`BASE_FPS`].
    pub const BASE_FRAME_DURATION: f64 = 1.0 / BASE_FPS;
}

/// Memory budget constants.
pub mod memory_budget {
    /// Default ceiling for undo history memory.
    pub const HISTORY_MEMORY_CEILING: usize = 500 * 1024 * 1024; // 500 MB

    /// Default maximum number of undo steps.
    pub const HISTORY_MAX_COMMANDS: usize = 50;

    /// Hard cap on frames extracted from one source.
    pub const MAX_EXTRACTED_FRAMES: usize = 3000;

    /// Frames decoded concurrently per extraction batch.
    pub const EXTRACTION_BATCH_SIZE: usize = 20;
}
