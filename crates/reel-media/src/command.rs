//! Merge tool command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Default merge tool looked up on `PATH`.
pub const DEFAULT_TOOL: &str = "ffmpeg";

/// Builder for a stream-copy concat invocation.
#[derive(Debug, Clone)]
pub struct ConcatCommand {
    /// Manifest listing the inputs in order
    manifest: PathBuf,
    /// Output file path, always overwritten
    output: PathBuf,
}

impl ConcatCommand {
    /// Create a new concat command.
    pub fn new(manifest: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            manifest: manifest.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        // Concat demuxer; absolute and quoted paths are allowed
        args.extend(["-f", "concat", "-safe", "0"].map(String::from));

        args.push("-i".to_string());
        args.push(self.manifest.to_string_lossy().to_string());

        // Stream copy, no re-encode
        args.push("-c".to_string());
        args.push("copy".to_string());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Captured result of one tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
    /// Full standard error text
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Convert a non-zero exit into [`MediaError::ToolFailed`].
    pub fn into_result(self) -> MediaResult<()> {
        if self.success() {
            Ok(())
        } else {
            Err(MediaError::tool_failed(self.exit_code, self.stderr))
        }
    }
}

/// Run the tool to completion, capturing stderr before reporting.
pub async fn run_tool(tool: &Path, cmd: &ConcatCommand) -> MediaResult<ToolOutput> {
    let args = cmd.build_args();
    debug!("Running merge tool: {} {}", tool.display(), args.join(" "));

    let output = Command::new(tool)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            MediaError::tool_unavailable(format!("failed to start {}: {}", tool.display(), e))
        })?;

    Ok(ToolOutput {
        exit_code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Locate the merge tool.
///
/// An explicitly configured path must exist; otherwise `ffmpeg` is looked up
/// on `PATH`.
pub fn locate_tool(configured: Option<&Path>) -> MediaResult<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(MediaError::tool_unavailable(format!(
            "{} does not exist",
            path.display()
        ))),
        None => which::which(DEFAULT_TOOL)
            .map_err(|_| MediaError::tool_unavailable(format!("{} not found in PATH", DEFAULT_TOOL))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let cmd = ConcatCommand::new("/tmp/list.txt", "/tmp/out.mp4");
        assert_eq!(
            cmd.build_args(),
            vec![
                "-y", "-f", "concat", "-safe", "0", "-i", "/tmp/list.txt", "-c", "copy",
                "/tmp/out.mp4"
            ]
        );
    }

    #[test]
    fn test_missing_configured_tool() {
        let err = locate_tool(Some(Path::new("/definitely/not/here/ffmpeg"))).unwrap_err();
        assert!(matches!(err, MediaError::ToolUnavailable(_)));
    }

    #[test]
    fn test_tool_output_result() {
        let ok = ToolOutput {
            exit_code: Some(0),
            stderr: String::new(),
        };
        assert!(ok.into_result().is_ok());

        let failed = ToolOutput {
            exit_code: Some(1),
            stderr: "moov atom not found".to_string(),
        };
        match failed.into_result() {
            Err(MediaError::ToolFailed { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "moov atom not found");
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }
}
