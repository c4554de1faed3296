use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{color::WHITE, Color, Result};

/// Top-level configuration structure for the toolkit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Folder that relative media file names are resolved against.
    pub media_folder: Option<PathBuf>,
    pub sound: SoundConfig,
    pub picture: PictureConfig,
}

impl MediaConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Defaults and limits for sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channels: u16,
    /// Longest sound, in seconds, that may be created from scratch.
    pub max_seconds: f64,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            sample_size: 16,
            channels: 1,
            max_seconds: 600.0,
        }
    }
}

/// Defaults and limits for pictures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureConfig {
    /// Largest width or height accepted for a new picture.
    pub max_dimension: usize,
    pub background: Color,
}

impl Default for PictureConfig {
    fn default() -> Self {
        Self {
            max_dimension: 10_000,
            background: WHITE,
        }
    }
}
