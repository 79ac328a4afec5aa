//! Media file probing to get metadata without full decode.
//!
//! Wraps `ffprobe -show_streams -show_format` and keeps only the fields the
//! ingest pipeline plans with.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Duration in seconds
    pub duration: f64,
    /// Video streams
    pub video_streams: Vec<VideoStreamInfo>,
    /// Number of audio streams (ignored by ingestion)
    pub audio_stream_count: usize,
    /// Container format
    pub format: String,
}

/// Information about a video stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub duration: Option<f64>,
}

// ── ffprobe JSON shape ─────────────────────────────────────────

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    #[serde(default)]
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

/// Parse an ffprobe rate such as `"30000/1001"` or `"25"`. `0/0` yields `None`.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_seconds(value: Option<&String>) -> Option<f64> {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

impl MediaProbe {
    /// Probe a media file with the `ffprobe` binary at `ffprobe`.
    pub fn probe(ffprobe: &Path, path: &Path) -> Result<Self, DecodeError> {
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(DecodeError::Open {
                path: path_str,
                reason: "file not found".into(),
            });
        }

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(DecodeError::Open {
                path: path_str,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::from_ffprobe_json(&path_str, &output.stdout)
    }

    /// Build a probe from raw ffprobe JSON output.
    pub fn from_ffprobe_json(path: &str, json: &[u8]) -> Result<Self, DecodeError> {
        let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| DecodeError::Open {
            path: path.to_string(),
            reason: format!("unreadable probe output: {e}"),
        })?;

        let mut audio_stream_count = 0;
        let mut video_streams = Vec::new();
        for stream in &parsed.streams {
            match stream.codec_type.as_deref() {
                Some("video") => {
                    let (Some(width), Some(height)) = (stream.width, stream.height) else {
                        continue;
                    };
                    let frame_rate = stream
                        .avg_frame_rate
                        .as_deref()
                        .and_then(parse_rate)
                        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
                        .unwrap_or(0.0);
                    video_streams.push(VideoStreamInfo {
                        index: stream.index,
                        codec: stream.codec_name.clone().unwrap_or_default(),
                        width,
                        height,
                        frame_rate,
                        duration: parse_seconds(stream.duration.as_ref()),
                    });
                }
                Some("audio") => audio_stream_count += 1,
                _ => {}
            }
        }

        let format_duration = parsed
            .format
            .as_ref()
            .and_then(|f| parse_seconds(f.duration.as_ref()));
        let duration = format_duration
            .or_else(|| video_streams.first().and_then(|v| v.duration))
            .unwrap_or(0.0);

        debug!(
            path,
            duration,
            video_streams = video_streams.len(),
            "Probed media"
        );

        Ok(Self {
            path: path.to_string(),
            duration,
            video_streams,
            audio_stream_count,
            format: parsed
                .format
                .and_then(|f| f.format_name)
                .unwrap_or_default(),
        })
    }

    /// Check if the file has video.
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Get the primary video stream info.
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }
}
