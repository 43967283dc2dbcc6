//! Structured scene logging.

use reel_models::{SceneIndex, SubmissionId};
use tracing::{error, info, warn, Span};

/// Logger for one scene operation with consistent fields.
///
/// Every line carries the scene number, the submission (once known) and the
/// operation name, so interleaved output from concurrent scenes stays readable.
#[derive(Debug, Clone)]
pub struct SceneLogger {
    scene: SceneIndex,
    submission: Option<SubmissionId>,
    operation: String,
}

impl SceneLogger {
    /// Create a logger for a scene and operation.
    ///
    /// # Arguments
    /// * `scene` - Slot of the scene being worked on
    /// * `operation` - The type of operation (e.g., "video_generation", "combine")
    pub fn new(scene: SceneIndex, operation: &str) -> Self {
        Self {
            scene,
            submission: None,
            operation: operation.to_string(),
        }
    }

    /// Attach the submission this operation belongs to.
    pub fn with_submission(mut self, submission: SubmissionId) -> Self {
        self.submission = Some(submission);
        self
    }

    /// Log the start of a scene operation.
    pub fn log_start(&self, message: &str) {
        info!(
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation,
            "Scene started: {}", message
        );
    }

    /// Log a progress update, such as a remote status change.
    pub fn log_progress(&self, message: &str) {
        info!(
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation,
            "Scene progress: {}", message
        );
    }

    /// Log a warning during the operation.
    pub fn log_warning(&self, message: &str) {
        warn!(
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation,
            "Scene warning: {}", message
        );
    }

    /// Log a failure of the operation.
    pub fn log_error(&self, message: &str) {
        error!(
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation,
            "Scene error: {}", message
        );
    }

    /// Log the successful end of the operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation,
            "Scene completed: {}", message
        );
    }

    /// Get the scene index.
    pub fn scene(&self) -> SceneIndex {
        self.scene
    }

    /// Get the operation type.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span for a scene task; poller logs nest under it.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "scene",
            scene = %self.scene,
            submission = ?self.submission.map(|s| s.0),
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_logger_creation() {
        let logger = SceneLogger::new(SceneIndex(3), "video_generation")
            .with_submission(SubmissionId(7));

        assert_eq!(logger.scene(), SceneIndex(3));
        assert_eq!(logger.operation(), "video_generation");
    }
}
