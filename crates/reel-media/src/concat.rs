//! Ordered concatenation of scene videos.
//!
//! The merge runs the external tool once in stream-copy mode against a
//! manifest file. The manifest is removed on every exit path; the output file
//! is not transactional and a failed run may leave a partial file behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::command::{locate_tool, run_tool, ConcatCommand};
use crate::error::{MediaError, MediaResult};

/// Configuration for the concatenator.
#[derive(Debug, Clone, Default)]
pub struct ConcatConfig {
    /// Explicit merge tool location; `PATH` lookup when unset
    pub tool_path: Option<PathBuf>,
    /// Directory for manifests; system temp dir when unset
    pub manifest_dir: Option<PathBuf>,
}

impl ConcatConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            tool_path: std::env::var("FFMPEG_PATH").ok().map(PathBuf::from),
            manifest_dir: std::env::var("REEL_MANIFEST_DIR").ok().map(PathBuf::from),
        }
    }
}

/// Merges ordered video files into one.
#[derive(Debug, Clone, Default)]
pub struct VideoConcatenator {
    config: ConcatConfig,
}

impl VideoConcatenator {
    pub fn new(config: ConcatConfig) -> Self {
        Self { config }
    }

    /// Concatenate `ordered` into `output`, preserving order.
    pub async fn combine(&self, ordered: &[PathBuf], output: &Path) -> MediaResult<PathBuf> {
        if ordered.len() < 2 {
            return Err(MediaError::InsufficientInputs(ordered.len()));
        }

        for path in ordered {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => {}
                _ => return Err(MediaError::MissingSource(path.clone())),
            }
        }

        let tool = locate_tool(self.config.tool_path.as_deref())?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let manifest = self.write_manifest(ordered)?;
        let cmd = ConcatCommand::new(manifest.path(), output);

        info!(
            inputs = ordered.len(),
            output = %output.display(),
            "Concatenating scene videos"
        );
        let result = run_tool(&tool, &cmd).await;

        let manifest_path = manifest.path().to_path_buf();
        if let Err(e) = manifest.close() {
            warn!(
                "Failed to remove concat manifest {}: {}",
                manifest_path.display(),
                e
            );
        }

        result?.into_result()?;

        info!("Concatenated video: {}", output.display());
        Ok(output.to_path_buf())
    }

    fn write_manifest(&self, ordered: &[PathBuf]) -> MediaResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("concat-").suffix(".txt");

        let mut file = match &self.config.manifest_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(manifest_body(ordered).as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

/// Render the concat manifest: one single-quoted `file` line per input.
pub fn manifest_body(ordered: &[PathBuf]) -> String {
    ordered
        .iter()
        .map(|p| {
            let normalized = p.to_string_lossy().replace('\\', "/");
            format!("file '{}'\n", normalized.replace('\'', "'\\''"))
        })
        .collect()
}
