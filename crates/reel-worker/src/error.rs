//! Orchestration error types.

use reel_ai_client::AiError;
use reel_media::MediaError;
use reel_models::{ParamError, SceneIndex};
use thiserror::Error;

use crate::registry::RegistryError;

pub type ReelResult<T> = Result<T, ReelError>;

/// Failure category, as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad prompt, count, duration or resolution; nothing was started
    Input,
    /// Text or video service failure
    Upstream,
    /// A job succeeded but produced no video
    Artifact,
    /// Merge tool missing or failed
    Tool,
    /// Scene cap reached
    Capacity,
    /// Operation not allowed in the current state
    State,
}

#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Invalid parameters: {0}")]
    Params(#[from] ParamError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("No video produced for scene {}", .0.number())]
    NoArtifact(SceneIndex),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Scene {} has no finished video", .0.number())]
    SceneNotReady(SceneIndex),

    #[error("Scenes not ready for combining: {0}")]
    GateClosed(String),

    #[error("A combine is already running")]
    CombineInProgress,

    #[error("No combined video is available")]
    NoCombinedVideo,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReelError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReelError::Input(_) | ReelError::Params(_) => ErrorKind::Input,
            ReelError::Ai(e) if e.is_artifact() => ErrorKind::Artifact,
            ReelError::Ai(AiError::Config(_)) => ErrorKind::Input,
            ReelError::Ai(_) => ErrorKind::Upstream,
            ReelError::NoArtifact(_) => ErrorKind::Artifact,
            ReelError::Media(e) if e.is_tool_error() => ErrorKind::Tool,
            ReelError::Media(MediaError::InsufficientInputs(_))
            | ReelError::Media(MediaError::MissingSource(_))
            | ReelError::Media(MediaError::FileNotFound(_)) => ErrorKind::State,
            ReelError::Media(_) | ReelError::Io(_) => ErrorKind::Tool,
            ReelError::Registry(RegistryError::CapacityExceeded(_)) => ErrorKind::Capacity,
            ReelError::Registry(_)
            | ReelError::SceneNotReady(_)
            | ReelError::GateClosed(_)
            | ReelError::CombineInProgress
            | ReelError::NoCombinedVideo => ErrorKind::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobId;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ReelError::input("empty prompt").kind(), ErrorKind::Input);
        assert_eq!(
            ReelError::from(ParamError::InvalidSceneCount(11)).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            ReelError::from(AiError::request_failed(500, "boom")).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            ReelError::from(AiError::NoArtifact(JobId::from_string("j"))).kind(),
            ErrorKind::Artifact
        );
        assert_eq!(
            ReelError::from(AiError::from(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full"
            )))
            .kind(),
            ErrorKind::Artifact
        );
        assert_eq!(
            ReelError::from(MediaError::tool_failed(Some(1), "bad input")).kind(),
            ErrorKind::Tool
        );
        assert_eq!(
            ReelError::from(RegistryError::CapacityExceeded(10)).kind(),
            ErrorKind::Capacity
        );
        assert_eq!(ReelError::CombineInProgress.kind(), ErrorKind::State);
    }
}
