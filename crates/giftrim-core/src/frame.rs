//! Frame image buffers in CPU memory.
//!
//! Every image is tightly packed 8-bit RGBA (4 bytes per pixel, no row
//! padding), which is what the decoder emits and the encoder consumes.

use crate::error::{GifTrimError, Result};
use std::sync::Arc;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Packed RGBA pixel data, `width * height * 4` bytes
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Create a transparent black image with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Wrap raw RGBA bytes, validating the buffer length.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(GifTrimError::InvalidParameter(format!(
                "RGBA buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create an opaque image filled with one color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut image = Self::new(width, height);
        for px in image.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[..3].copy_from_slice(&rgb);
            px[3] = 255;
        }
        image
    }

    /// Total memory usage of the pixel data in bytes.
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    /// Get a mutable row of pixel data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// RGBA value at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.data.get(i..i + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Overwrite the pixel at `(x, y)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        if let Some(px) = self.data.get_mut(i..i + BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Create a test pattern image (color bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        const BARS: [[u8; 4]; 8] = [
            [255, 255, 255, 255], // White
            [255, 255, 0, 255],   // Yellow
            [0, 255, 255, 255],   // Cyan
            [0, 255, 0, 255],     // Green
            [255, 0, 255, 255],   // Magenta
            [255, 0, 0, 255],     // Red
            [0, 0, 255, 255],     // Blue
            [0, 0, 0, 255],       // Black
        ];

        let mut image = Self::new(width, height);
        for y in 0..height {
            let row = image.row_mut(y);
            for x in 0..width {
                let i = x as usize * BYTES_PER_PIXEL;
                let bar = (x as usize * 8 / width.max(1) as usize).min(7);
                row[i..i + BYTES_PER_PIXEL].copy_from_slice(&BARS[bar]);
            }
        }
        image
    }
}

/// Arc-wrapped image for cheap sharing between a timeline and its undo snapshots.
pub type SharedFrameImage = Arc<FrameImage>;
