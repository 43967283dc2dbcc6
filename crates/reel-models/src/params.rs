//! Generation parameters and their validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest number of scenes a prompt may be split into.
pub const MIN_SCENE_COUNT: usize = 1;
/// Largest number of scenes (also the registry capacity).
pub const MAX_SCENE_COUNT: usize = 10;
/// Shortest clip the video service is asked for.
pub const MIN_DURATION_SECONDS: u32 = 1;
/// Longest clip the video service is asked for.
pub const MAX_DURATION_SECONDS: u32 = 20;

/// Output resolution presets supported by the video service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// 1280x720
    #[default]
    Landscape,
    /// 720x1280
    Portrait,
}

impl Resolution {
    pub const ALL: &'static [Resolution] = &[Resolution::Landscape, Resolution::Portrait];

    pub fn width(&self) -> u32 {
        match self {
            Resolution::Landscape => 1280,
            Resolution::Portrait => 720,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Resolution::Landscape => 720,
            Resolution::Portrait => 1280,
        }
    }

    /// Look up the preset matching an exact width and height.
    pub fn from_dimensions(width: u32, height: u32) -> Result<Self, ParamError> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.width() == width && r.height() == height)
            .ok_or(ParamError::UnsupportedResolution(format!("{}x{}", width, height)))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

impl FromStr for Resolution {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .to_lowercase()
            .split_once('x')
            .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
            .ok_or_else(|| ParamError::UnsupportedResolution(s.to_string()))?;

        let width = w
            .parse()
            .map_err(|_| ParamError::UnsupportedResolution(s.to_string()))?;
        let height = h
            .parse()
            .map_err(|_| ParamError::UnsupportedResolution(s.to_string()))?;

        Self::from_dimensions(width, height)
    }
}

/// Per-scene request parameters for the video service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationParams {
    /// Requested clip length in seconds
    pub duration_seconds: u32,
    /// Requested output resolution
    pub resolution: Resolution,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            duration_seconds: 10,
            resolution: Resolution::Landscape,
        }
    }
}

impl GenerationParams {
    /// Create validated parameters.
    pub fn new(duration_seconds: u32, resolution: Resolution) -> Result<Self, ParamError> {
        let params = Self {
            duration_seconds,
            resolution,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&self.duration_seconds) {
            return Err(ParamError::InvalidDuration(self.duration_seconds));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.resolution.width()
    }

    pub fn height(&self) -> u32 {
        self.resolution.height()
    }
}

/// Validate a requested scene count.
pub fn validate_scene_count(count: usize) -> Result<(), ParamError> {
    if (MIN_SCENE_COUNT..=MAX_SCENE_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(ParamError::InvalidSceneCount(count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Unsupported resolution: {0}, expected 1280x720 or 720x1280")]
    UnsupportedResolution(String),
    #[error("Invalid duration: {0}s, expected 1-20 seconds")]
    InvalidDuration(u32),
    #[error("Invalid scene count: {0}, expected 1-10")]
    InvalidSceneCount(usize),
}
