//! Remote video-generation job definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GenerationParams;

/// Job identifier issued by the video service on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one generation (output video) of a succeeded job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GenerationId(pub String);

impl GenerationId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status as reported by the video service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemoteJobStatus {
    Queued,
    Preprocessing,
    Running,
    Processing,
    Succeeded,
    Failed,
    #[serde(alias = "canceled")]
    Cancelled,
    /// Any status string this client does not know; treated as still running
    #[serde(other)]
    Unknown,
}

impl RemoteJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteJobStatus::Queued => "queued",
            RemoteJobStatus::Preprocessing => "preprocessing",
            RemoteJobStatus::Running => "running",
            RemoteJobStatus::Processing => "processing",
            RemoteJobStatus::Succeeded => "succeeded",
            RemoteJobStatus::Failed => "failed",
            RemoteJobStatus::Cancelled => "cancelled",
            RemoteJobStatus::Unknown => "unknown",
        }
    }

    /// Check if this is a terminal state (polling stops).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemoteJobStatus::Succeeded | RemoteJobStatus::Failed | RemoteJobStatus::Cancelled
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RemoteJobStatus::Failed | RemoteJobStatus::Cancelled)
    }
}

impl fmt::Display for RemoteJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request for one video generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// Scene description used as the video prompt
    pub prompt: String,
    /// Clip length in seconds
    pub duration_seconds: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, params: &GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            duration_seconds: params.duration_seconds,
            width: params.width(),
            height: params.height(),
        }
    }
}

/// One in-flight remote job, tracked by the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationJob {
    /// Service-issued job id
    pub job_id: JobId,
    /// Last status seen
    pub remote_status: RemoteJobStatus,
    /// Number of status queries made so far
    pub poll_attempts: u32,
}

impl GenerationJob {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            remote_status: RemoteJobStatus::Queued,
            poll_attempts: 0,
        }
    }

    /// Record the result of one status query.
    pub fn record_poll(&mut self, status: RemoteJobStatus) {
        self.remote_status = status;
        self.poll_attempts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolution;

    #[test]
    fn test_remote_status_parse() {
        let status: RemoteJobStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(status, RemoteJobStatus::Succeeded);
        assert!(status.is_terminal());

        let status: RemoteJobStatus = serde_json::from_str("\"warming_up\"").unwrap();
        assert_eq!(status, RemoteJobStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_failure_statuses() {
        assert!(RemoteJobStatus::Failed.is_failure());
        assert!(RemoteJobStatus::Cancelled.is_failure());
        assert!(!RemoteJobStatus::Succeeded.is_failure());
        assert!(!RemoteJobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_request_from_params() {
        let params = GenerationParams::new(5, Resolution::Portrait).unwrap();
        let req = GenerationRequest::new("A city.", &params);
        assert_eq!(req.width, 720);
        assert_eq!(req.height, 1280);
        assert_eq!(req.duration_seconds, 5);
    }

    #[test]
    fn test_job_records_polls() {
        let mut job = GenerationJob::new(JobId::from_string("task_1"));
        job.record_poll(RemoteJobStatus::Processing);
        job.record_poll(RemoteJobStatus::Succeeded);
        assert_eq!(job.poll_attempts, 2);
        assert_eq!(job.remote_status, RemoteJobStatus::Succeeded);
    }
}
