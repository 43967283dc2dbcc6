//! AI client error types.

use reel_models::{JobId, RemoteJobStatus};
use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Job didn't succeed. Status: {status}{}", reason_suffix(.reason))]
    JobFailed {
        status: RemoteJobStatus,
        reason: Option<String>,
    },

    #[error("No generations found in result of job {0}")]
    NoArtifact(JobId),

    #[error("Job still running after {0} seconds")]
    Timeout(u64),

    #[error("Polling cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

impl AiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn request_failed(status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            body: body.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transport, auth or service-side failures.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AiError::RequestFailed { .. }
                | AiError::InvalidResponse(_)
                | AiError::JobFailed { .. }
                | AiError::Timeout(_)
                | AiError::Network(_)
                | AiError::Json(_)
        )
    }

    /// The job succeeded remotely but produced nothing usable, or the
    /// downloaded bytes could not be written locally.
    pub fn is_artifact(&self) -> bool {
        matches!(self, AiError::NoArtifact(_) | AiError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_failed_names_status() {
        let err = AiError::JobFailed {
            status: RemoteJobStatus::Failed,
            reason: None,
        };
        assert_eq!(err.to_string(), "Job didn't succeed. Status: failed");

        let err = AiError::JobFailed {
            status: RemoteJobStatus::Cancelled,
            reason: Some("moderation".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Job didn't succeed. Status: cancelled (moderation)"
        );
    }

    #[test]
    fn test_classification() {
        assert!(AiError::request_failed(401, "unauthorized").is_upstream());
        assert!(AiError::NoArtifact(JobId::from_string("job")).is_artifact());
        assert!(!AiError::Cancelled.is_upstream());

        let write_failed = AiError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only scratch dir",
        ));
        assert!(write_failed.is_artifact());
        assert!(!write_failed.is_upstream());
    }
}
