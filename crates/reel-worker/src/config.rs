//! Orchestration configuration.

use std::path::PathBuf;

use reel_models::{GenerationParams, Resolution};

/// Orchestration configuration.
#[derive(Debug, Clone)]
pub struct ReelConfig {
    /// Directory for scene artifacts and preview output
    pub scratch_dir: PathBuf,
    /// Parameters applied to scenes created without explicit ones
    pub default_params: GenerationParams,
    /// File name of the combined preview inside `scratch_dir`
    pub combined_file_name: String,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("reelsmith"),
            default_params: GenerationParams::default(),
            combined_file_name: "combined_video.mp4".to_string(),
        }
    }
}

impl ReelConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable or out-of-range values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let duration_seconds = std::env::var("REEL_DEFAULT_DURATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_params.duration_seconds);
        let resolution = std::env::var("REEL_DEFAULT_RESOLUTION")
            .ok()
            .and_then(|s| s.parse::<Resolution>().ok())
            .unwrap_or(defaults.default_params.resolution);

        Self {
            scratch_dir: std::env::var("REEL_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            default_params: GenerationParams::new(duration_seconds, resolution)
                .unwrap_or(defaults.default_params),
            combined_file_name: defaults.combined_file_name,
        }
    }

    /// Default location of the combined preview.
    pub fn preview_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.combined_file_name)
    }
}
