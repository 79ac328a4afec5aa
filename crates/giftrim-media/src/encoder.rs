//! Encoder capability consumed once editing is finished.
//!
//! Palette quantization and the byte format belong to the implementor;
//! [`encode_timeline`] only prepares the timeline and enforces the options
//! that are independent of the format.

use crate::error::EncodeError;
use giftrim_core::EncodeSettings;
use giftrim_timeline::{ops, Timeline};
use tracing::{info, warn};

/// Options handed to the encoder.
pub type EncodeOptions = EncodeSettings;

/// Turns a finished timeline into animated-image bytes.
pub trait AnimationEncoder: Send + Sync {
    /// Short format name, e.g. `"gif"`.
    fn format(&self) -> &str;

    fn encode(&self, timeline: &Timeline, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError>;
}

/// Downscale to `options.max_width`, encode, and check `max_file_size_kb`.
pub fn encode_timeline(
    encoder: &dyn AnimationEncoder,
    timeline: &Timeline,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    if timeline.is_empty() {
        return Err(EncodeError::EmptyTimeline);
    }

    let scaled;
    let input = match options.max_width {
        Some(max_width) if timeline.dimensions().is_some_and(|(w, _)| w > max_width) => {
            let mut copy = timeline.clone();
            ops::resize(&mut copy, max_width);
            scaled = copy;
            &scaled
        }
        _ => timeline,
    };

    let bytes = encoder.encode(input, options)?;

    if let Some(limit_kb) = options.max_file_size_kb {
        let size_kb = bytes.len() as u64 / 1024;
        if size_kb > limit_kb {
            warn!(size_kb, limit_kb, "Encoded output exceeds size limit");
            return Err(EncodeError::Failed(format!(
                "output is {size_kb} KB, limit is {limit_kb} KB"
            )));
        }
    }

    info!(
        format = encoder.format(),
        frames = input.len(),
        bytes = bytes.len(),
        "Encoded timeline"
    );
    Ok(bytes)
}
