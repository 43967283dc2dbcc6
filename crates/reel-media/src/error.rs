//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while merging or exporting videos.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("At least 2 videos are required to combine, got {0}")]
    InsufficientInputs(usize),

    #[error("Source video not found: {0}")]
    MissingSource(PathBuf),

    #[error("Merge tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Merge tool exited with {}: {stderr}", exit_code_text(.exit_code))]
    ToolFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl MediaError {
    /// Create a tool failure error.
    pub fn tool_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ToolFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a tool unavailable error.
    pub fn tool_unavailable(message: impl Into<String>) -> Self {
        Self::ToolUnavailable(message.into())
    }

    /// Errors raised by the external merge tool itself (missing or failed).
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            MediaError::ToolUnavailable(_) | MediaError::ToolFailed { .. }
        )
    }
}
