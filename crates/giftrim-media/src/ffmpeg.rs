//! FFmpeg-backed decoder via ffmpeg-sidecar.
//!
//! Spawns `ffprobe` once on open and one short-lived `ffmpeg` per decoded
//! frame, which keeps sources `Sync` without sharing a process between
//! concurrent decodes.

use crate::decoder::{MediaDecoder, VideoSource};
use crate::error::DecodeError;
use crate::probe::MediaProbe;
use giftrim_core::FrameImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info};

/// Opens files with the FFmpeg binaries ffmpeg-sidecar resolves.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegDecoder {
    /// Use the sidecar's ffmpeg and the ffprobe installed next to it.
    pub fn new() -> Self {
        let ffmpeg = ffmpeg_sidecar::paths::ffmpeg_path();
        let ffprobe = ffmpeg.with_file_name(if cfg!(windows) {
            "ffprobe.exe"
        } else {
            "ffprobe"
        });
        Self { ffmpeg, ffprobe }
    }

    /// Use explicit binary locations.
    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDecoder for FfmpegDecoder {
    fn open_source(&self, path: &Path) -> Result<Arc<dyn VideoSource>, DecodeError> {
        let source = FfmpegSource::open(&self.ffmpeg, &self.ffprobe, path)?;
        Ok(Arc::new(source))
    }
}

/// A probed file decoded frame-by-frame with ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    ffmpeg: PathBuf,
    path: PathBuf,
    probe: MediaProbe,
}

impl FfmpegSource {
    pub fn open(ffmpeg: &Path, ffprobe: &Path, path: &Path) -> Result<Self, DecodeError> {
        info!("Opening video file: {}", path.display());
        let probe = MediaProbe::probe(ffprobe, path)?;
        Ok(Self {
            ffmpeg: ffmpeg.to_path_buf(),
            path: path.to_path_buf(),
            probe,
        })
    }

    pub fn probe(&self) -> &MediaProbe {
        &self.probe
    }
}

impl VideoSource for FfmpegSource {
    fn has_video(&self) -> bool {
        self.probe.has_video()
    }

    fn duration(&self) -> f64 {
        self.probe.duration
    }

    fn native_frame_rate(&self) -> f64 {
        self.probe.primary_video().map_or(0.0, |v| v.frame_rate)
    }

    fn native_size(&self) -> (u32, u32) {
        self.probe
            .primary_video()
            .map_or((0, 0), |v| (v.width, v.height))
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

        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss", &format!("{time:.3}"), "-i"])
            .arg(&self.path)
            .args([
                "-frames:v",
                "1",
                "-vf",
                &format!("scale={width}:{height}"),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-",
            ])
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(DecodeError::Frame {
                time,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(time, bytes = output.stdout.len(), "Decoded frame");
        FrameImage::from_rgba(width, height, output.stdout).map_err(|e| DecodeError::Frame {
            time,
            reason: e.to_string(),
        })
    }
}
