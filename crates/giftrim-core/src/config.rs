//! Editor settings with versioned JSON persistence.
//!
//! Settings live at `{config_dir}/giftrim/settings.json`. A missing file
//! yields defaults; files written by a newer schema are rejected.

use crate::error::{GifTrimError, Result};
use crate::memory_budget;
use crate::timing::{BASE_FPS, BASE_FRAME_DURATION, MIN_FRAME_DURATION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 1;

/// Undo history limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of undo steps kept.
    pub max_commands: usize,
    /// Ceiling on the summed memory cost of the undo stack, in bytes.
    pub memory_ceiling_bytes: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_commands: memory_budget::HISTORY_MAX_COMMANDS,
            memory_ceiling_bytes: memory_budget::HISTORY_MEMORY_CEILING,
        }
    }
}

/// Video-to-frames ingestion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Sampling rate requested from the source.
    pub target_fps: f64,
    /// Hard cap on extracted frames.
    pub max_frames: usize,
    /// Timestamps decoded concurrently per batch.
    pub batch_size: usize,
    /// Duration every frame is normalized to after extraction.
    pub output_frame_duration: f64,
    /// Sources shorter than this are rejected as too short.
    pub min_source_duration: f64,
    /// Run the optimizer toward this size (KB) once frames are extracted.
    pub post_optimize_kb: Option<u64>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            target_fps: BASE_FPS,
            max_frames: memory_budget::MAX_EXTRACTED_FRAMES,
            batch_size: memory_budget::EXTRACTION_BATCH_SIZE,
            output_frame_duration: BASE_FRAME_DURATION,
            min_source_duration: 0.1,
            post_optimize_kb: None,
        }
    }
}

/// Frame-reduction parameters used by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeSettings {
    /// Size the optimizer aims for, in KB.
    pub target_size_kb: u64,
    /// Mean sampled byte difference (0..1) below which two frames are similar.
    pub similarity_threshold: f64,
    /// Tighter threshold used when compacting static runs.
    pub static_threshold: f64,
    /// Frames shorter than this are merged with their neighbours.
    pub min_frame_duration: f64,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            target_size_kb: 2048,
            similarity_threshold: 0.02,
            static_threshold: 0.005,
            min_frame_duration: 0.05,
        }
    }
}

/// Options forwarded to the external animated-image encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub max_colors: u16,
    pub dither: bool,
    /// Encoder quality, 0..=100.
    pub quality: u8,
    /// 0 loops forever.
    pub loop_count: u16,
    pub max_width: Option<u32>,
    pub max_file_size_kb: Option<u64>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            max_colors: 256,
            dither: true,
            quality: 80,
            loop_count: 0,
            max_width: Some(640),
            max_file_size_kb: None,
        }
    }
}

/// All persisted editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Schema version for migration.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default)]
    pub optimize: OptimizeSettings,
    #[serde(default)]
    pub encode: EncodeSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            history: HistorySettings::default(),
            ingest: IngestSettings::default(),
            optimize: OptimizeSettings::default(),
            encode: EncodeSettings::default(),
        }
    }
}

impl EditorSettings {
    /// Default settings file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("giftrim").join("settings.json"))
    }

    /// Parse settings from JSON bytes and sanitize them.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let mut settings: Self = serde_json::from_slice(data)
            .map_err(|e| GifTrimError::Serialization(format!("Invalid settings JSON: {e}")))?;

        if settings.version > SETTINGS_VERSION {
            return Err(GifTrimError::Serialization(format!(
                "Settings version {} is newer than supported version {}",
                settings.version, SETTINGS_VERSION
            )));
        }

        settings.version = SETTINGS_VERSION;
        settings.sanitize();
        Ok(settings)
    }

    /// Serialize to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| GifTrimError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    /// Load settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read(path)?;
        let settings = Self::from_json(&data)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Clamp out-of-range values to usable ones.
    pub fn sanitize(&mut self) {
        let ingest = &mut self.ingest;
        ingest.batch_size = ingest.batch_size.max(1);
        ingest.max_frames = ingest.max_frames.max(1);
        if !(ingest.target_fps > 0.0) {
            ingest.target_fps = BASE_FPS;
        }
        if !(ingest.output_frame_duration >= MIN_FRAME_DURATION) {
            ingest.output_frame_duration = MIN_FRAME_DURATION;
        }
        if !(ingest.min_source_duration >= 0.0) {
            ingest.min_source_duration = 0.0;
        }

        self.history.max_commands = self.history.max_commands.max(1);

        let optimize = &mut self.optimize;
        optimize.similarity_threshold = optimize.similarity_threshold.clamp(0.0, 1.0);
        optimize.static_threshold = optimize.static_threshold.clamp(0.0, 1.0);
        if !(optimize.min_frame_duration >= MIN_FRAME_DURATION) {
            optimize.min_frame_duration = MIN_FRAME_DURATION;
        }

        self.encode.quality = self.encode.quality.min(100);
        self.encode.max_colors = self.encode.max_colors.clamp(2, 256);
    }
}
