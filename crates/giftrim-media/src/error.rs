//! Error types for decoding, ingestion and encoding.

use thiserror::Error;

/// Failures reported by a decoder capability.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Source has no decodable video stream")]
    NoVideoStream,

    #[error("Failed to decode frame at {time:.3}s: {reason}")]
    Frame { time: f64, reason: String },

    #[error("Decoder process error: {0}")]
    Process(#[from] std::io::Error),
}

/// Why an ingestion produced no timeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No video track found")]
    NoVideoTrack,

    #[error("Video is too short ({duration:.2}s)")]
    TooShort { duration: f64 },

    #[error("No frames could be extracted")]
    EmptyResult,

    #[error("Import cancelled")]
    Cancelled,

    #[error("Decode failed: {0}")]
    Decode(#[source] DecodeError),
}

impl IngestError {
    /// Cancellation is user-initiated; every other variant is a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Human-readable status for the caller's progress display.
    pub fn status_message(&self) -> String {
        self.to_string()
    }
}

impl From<DecodeError> for IngestError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::NoVideoStream => Self::NoVideoTrack,
            other => Self::Decode(other),
        }
    }
}

/// Failures surfaced from an encoder capability.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Nothing to encode: timeline is empty")]
    EmptyTimeline,

    #[error("Encoder failed: {0}")]
    Failed(String),
}
