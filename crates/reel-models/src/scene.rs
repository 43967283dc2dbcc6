//! Scene definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{GenerationParams, JobId};

/// Stable index of a live scene.
///
/// Indices are allocated first-free, so an index can be reused only after
/// the scene holding it has been removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SceneIndex(pub u8);

impl SceneIndex {
    pub fn new(index: u8) -> Self {
        Self(index)
    }

    /// Zero-based index.
    pub fn get(&self) -> usize {
        self.0 as usize
    }

    /// One-based number, as shown to the operator ("Scene 1").
    pub fn number(&self) -> usize {
        self.get() + 1
    }
}

impl fmt::Display for SceneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one submission attempt for a scene.
///
/// Unique for the lifetime of a registry; terminal writes are keyed by it so
/// that a late result from an abandoned attempt cannot overwrite a newer one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local generation status of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    /// Not submitted yet
    #[default]
    Idle,
    /// Submission started, no remote job id yet
    Submitted,
    /// Remote job accepted and being polled
    Polling,
    /// Artifact downloaded
    Ready,
    /// Submission failed
    Failed,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Idle => "idle",
            SceneStatus::Submitted => "submitted",
            SceneStatus::Polling => "polling",
            SceneStatus::Ready => "ready",
            SceneStatus::Failed => "failed",
        }
    }

    /// A submission is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SceneStatus::Submitted | SceneStatus::Polling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SceneStatus::Ready | SceneStatus::Failed)
    }
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of prompt text mapped to one requested video artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Stable index
    pub index: SceneIndex,

    /// Scene description sent to the video service (operator-editable)
    pub text: String,

    /// Current status
    pub status: SceneStatus,

    /// Artifact path, present only while `Ready`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,

    /// Requested duration and resolution
    pub params: GenerationParams,

    /// Current submission, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionId>,

    /// Remote job of the current submission, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,

    /// Human-readable failure message, present only while `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,

    /// When the scene was last changed
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    pub fn new(index: SceneIndex, text: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            index,
            text: text.into(),
            status: SceneStatus::Idle,
            artifact_path: None,
            params,
            submission: None,
            job_id: None,
            failure: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == SceneStatus::Ready && self.artifact_path.is_some()
    }

    /// Check whether `submission` is the attempt this scene currently tracks.
    pub fn is_current(&self, submission: SubmissionId) -> bool {
        self.submission == Some(submission)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Start a new submission; discards any previous artifact or failure.
    pub fn begin_submission(&mut self, submission: SubmissionId) {
        self.status = SceneStatus::Submitted;
        self.submission = Some(submission);
        self.job_id = None;
        self.artifact_path = None;
        self.failure = None;
        self.touch();
    }

    pub fn set_polling(&mut self, job_id: JobId) {
        self.status = SceneStatus::Polling;
        self.job_id = Some(job_id);
        self.touch();
    }

    pub fn set_ready(&mut self, artifact_path: PathBuf) {
        self.status = SceneStatus::Ready;
        self.artifact_path = Some(artifact_path);
        self.failure = None;
        self.touch();
    }

    pub fn set_failed(&mut self, reason: impl Into<String>) {
        self.status = SceneStatus::Failed;
        self.artifact_path = None;
        self.failure = Some(reason.into());
        self.touch();
    }

    /// Replace the text. An existing artifact no longer matches the text,
    /// so a finished scene returns to `Idle`.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if self.status.is_terminal() {
            self.reset();
        }
        self.touch();
    }

    pub fn set_params(&mut self, params: GenerationParams) {
        self.params = params;
        if self.status.is_terminal() {
            self.reset();
        }
        self.touch();
    }

    fn reset(&mut self) {
        self.status = SceneStatus::Idle;
        self.artifact_path = None;
        self.failure = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_number_is_one_based() {
        assert_eq!(SceneIndex(0).number(), 1);
        assert_eq!(SceneIndex(9).number(), 10);
    }

    #[test]
    fn test_submission_clears_previous_artifact() {
        let mut scene = Scene::new(SceneIndex(0), "A city.", GenerationParams::default());
        scene.begin_submission(SubmissionId(1));
        scene.set_ready(PathBuf::from("/tmp/a.mp4"));
        assert!(scene.is_ready());

        scene.begin_submission(SubmissionId(2));
        assert_eq!(scene.status, SceneStatus::Submitted);
        assert!(scene.artifact_path.is_none());
        assert!(scene.is_current(SubmissionId(2)));
        assert!(!scene.is_current(SubmissionId(1)));
    }

    #[test]
    fn test_edit_invalidates_ready_scene() {
        let mut scene = Scene::new(SceneIndex(3), "A forest.", GenerationParams::default());
        scene.begin_submission(SubmissionId(7));
        scene.set_ready(PathBuf::from("/tmp/b.mp4"));

        scene.set_text("A darker forest.");
        assert_eq!(scene.status, SceneStatus::Idle);
        assert!(scene.artifact_path.is_none());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SceneStatus::Polling).unwrap();
        assert_eq!(json, "\"polling\"");
    }
}
