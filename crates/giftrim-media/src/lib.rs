//! GifTrim Media - Video ingestion and encoder interfaces
//!
//! This crate handles:
//! - The decoder capability and an FFmpeg-backed implementation
//! - Media file probing
//! - The cancellable, batched video-to-timeline ingest pipeline
//! - The encoder capability consumed after editing

pub mod cancel;
pub mod decoder;
pub mod dedup;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod ingest;
pub mod probe;

pub use cancel::CancelToken;
pub use decoder::{MediaDecoder, PatternSource, VideoSource};
pub use encoder::{encode_timeline, AnimationEncoder, EncodeOptions};
pub use error::{DecodeError, EncodeError, IngestError};
pub use ffmpeg::{FfmpegDecoder, FfmpegSource};
pub use ingest::{ExtractionPlan, IngestPipeline, IngestProgress, IngestStage};
pub use probe::MediaProbe;
