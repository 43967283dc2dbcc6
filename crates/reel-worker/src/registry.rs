//! Scene registry: the single source of truth for scene state.
//!
//! Scenes live in a fixed arena of [`MAX_SCENES`] slots. New scenes take the
//! smallest free slot, so indices are reused only after a deletion. Terminal
//! writes from pollers are keyed by [`SubmissionId`]; a write from a
//! superseded submission, or for a scene that no longer exists, changes
//! nothing and returns `false`.

use std::path::{Path, PathBuf};

use reel_models::{
    GenerationParams, JobId, Scene, SceneEvent, SceneIndex, SceneStatus, SubmissionId,
    MAX_SCENE_COUNT,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum number of live scenes.
pub const MAX_SCENES: usize = MAX_SCENE_COUNT;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Scene limit of {0} reached")]
    CapacityExceeded(usize),

    #[error("Scene {} does not exist", .0.number())]
    NotFound(SceneIndex),
}

/// Owns every scene and publishes a [`SceneEvent`] for each accepted change.
pub struct SceneRegistry {
    slots: Vec<Option<Scene>>,
    next_submission: u64,
    revision: u64,
    events: broadcast::Sender<SceneEvent>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slots: vec![None; MAX_SCENES],
            next_submission: 1,
            revision: 0,
            events,
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.events.subscribe()
    }

    /// Create a scene in the smallest free slot.
    pub fn add(
        &mut self,
        text: impl Into<String>,
        params: GenerationParams,
    ) -> Result<SceneIndex, RegistryError> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::CapacityExceeded(MAX_SCENES))?;
        // slot < MAX_SCENES, which fits in u8
        let index = SceneIndex(slot as u8);

        self.slots[slot] = Some(Scene::new(index, text, params));
        self.bump();
        debug!(scene = %index, "Scene added");
        self.publish_list();
        Ok(index)
    }

    /// Remove a scene. Its in-flight poller, if any, becomes a no-op.
    pub fn remove(&mut self, index: SceneIndex) -> Option<Scene> {
        let removed = self.slots.get_mut(index.get())?.take()?;
        self.bump();
        debug!(scene = %index, "Scene removed");
        self.publish_list();
        Some(removed)
    }

    /// Remove every scene.
    pub fn clear(&mut self) {
        if self.slots.iter().all(Option::is_none) {
            return;
        }
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.bump();
        self.publish_list();
    }

    pub fn set_text(
        &mut self,
        index: SceneIndex,
        text: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let scene = self.scene_mut(index)?;
        let before = scene.status;
        scene.set_text(text);
        let after = scene.status;
        self.after_edit(index, before, after);
        Ok(())
    }

    pub fn set_params(
        &mut self,
        index: SceneIndex,
        params: GenerationParams,
    ) -> Result<(), RegistryError> {
        let scene = self.scene_mut(index)?;
        let before = scene.status;
        scene.set_params(params);
        let after = scene.status;
        self.after_edit(index, before, after);
        Ok(())
    }

    /// Start a new submission for a scene; any earlier one is superseded.
    pub fn mark_submitted(&mut self, index: SceneIndex) -> Result<SubmissionId, RegistryError> {
        let submission = SubmissionId(self.next_submission);
        let scene = self.scene_mut(index)?;
        scene.begin_submission(submission);
        self.next_submission += 1;
        self.bump();
        self.publish_status(index, SceneStatus::Submitted, None);
        Ok(submission)
    }

    /// Record the remote job id of a submission.
    pub fn mark_polling(
        &mut self,
        index: SceneIndex,
        submission: SubmissionId,
        job_id: JobId,
    ) -> bool {
        let Some(scene) = self.current_mut(index, submission) else {
            return false;
        };
        if scene.status != SceneStatus::Submitted {
            return false;
        }
        scene.set_polling(job_id);
        self.publish_status(index, SceneStatus::Polling, None);
        true
    }

    /// Record the artifact of a finished submission.
    pub fn mark_ready(
        &mut self,
        index: SceneIndex,
        submission: SubmissionId,
        artifact: PathBuf,
    ) -> bool {
        let Some(scene) = self.current_mut(index, submission) else {
            return false;
        };
        if !scene.status.is_in_flight() {
            return false;
        }
        scene.set_ready(artifact);
        self.bump();
        self.publish_status(index, SceneStatus::Ready, None);
        true
    }

    /// Record the failure of a submission.
    pub fn mark_failed(
        &mut self,
        index: SceneIndex,
        submission: SubmissionId,
        reason: impl Into<String>,
    ) -> bool {
        let Some(scene) = self.current_mut(index, submission) else {
            return false;
        };
        if !scene.status.is_in_flight() {
            return false;
        }
        let reason = reason.into();
        scene.set_failed(reason.clone());
        self.bump();
        self.publish_status(index, SceneStatus::Failed, Some(reason));
        true
    }

    /// Publish a finished combine.
    pub fn notify_combine_ready(&self, output: &Path) {
        let _ = self.events.send(SceneEvent::combine_ready(output));
    }

    pub fn get(&self, index: SceneIndex) -> Option<&Scene> {
        self.slots.get(index.get()).and_then(Option::as_ref)
    }

    /// Live scenes in ascending index order.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.slots.iter().flatten()
    }

    pub fn indices(&self) -> Vec<SceneIndex> {
        self.scenes().map(|s| s.index).collect()
    }

    pub fn len(&self) -> usize {
        self.scenes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Artifacts of `Ready` scenes in ascending index order.
    pub fn snapshot_ordered_artifacts(&self) -> Vec<PathBuf> {
        self.scenes()
            .filter(|s| s.is_ready())
            .filter_map(|s| s.artifact_path.clone())
            .collect()
    }

    /// At least two scenes exist and every one of them is `Ready`.
    pub fn can_concatenate(&self) -> bool {
        self.len() >= 2 && self.scenes().all(Scene::is_ready)
    }

    /// Any scene has an outstanding submission.
    pub fn has_in_flight(&self) -> bool {
        self.scenes().any(|s| s.status.is_in_flight())
    }

    /// Scenes keeping the gate closed, with their status.
    pub fn blocking(&self) -> Vec<(SceneIndex, SceneStatus)> {
        self.scenes()
            .filter(|s| !s.is_ready())
            .map(|s| (s.index, s.status))
            .collect()
    }

    /// Counter advanced by every change that can affect the combine sources.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn scene_mut(&mut self, index: SceneIndex) -> Result<&mut Scene, RegistryError> {
        self.slots
            .get_mut(index.get())
            .and_then(Option::as_mut)
            .ok_or(RegistryError::NotFound(index))
    }

    fn current_mut(&mut self, index: SceneIndex, submission: SubmissionId) -> Option<&mut Scene> {
        let scene = self.slots.get_mut(index.get())?.as_mut()?;
        if scene.is_current(submission) {
            Some(scene)
        } else {
            debug!(
                scene = %index,
                submission = %submission,
                "Ignoring write from superseded submission"
            );
            None
        }
    }

    fn after_edit(&mut self, index: SceneIndex, before: SceneStatus, after: SceneStatus) {
        if before != after {
            self.bump();
            self.publish_status(index, after, None);
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn publish_list(&self) {
        let _ = self.events.send(SceneEvent::list_changed(self.indices()));
    }

    fn publish_status(&self, index: SceneIndex, status: SceneStatus, message: Option<String>) {
        let _ = self
            .events
            .send(SceneEvent::status_changed(index, status, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(n: usize) -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        for i in 0..n {
            registry
                .add(format!("scene text {}", i), GenerationParams::default())
                .unwrap();
        }
        registry
    }

    fn finish(registry: &mut SceneRegistry, index: SceneIndex) -> SubmissionId {
        let submission = registry.mark_submitted(index).unwrap();
        assert!(registry.mark_ready(
            index,
            submission,
            PathBuf::from(format!("/tmp/scene_{}.mp4", index.number()))
        ));
        submission
    }

    #[test]
    fn test_first_free_index_reuse() {
        let mut registry = registry_with(3);
        assert_eq!(
            registry.indices(),
            vec![SceneIndex(0), SceneIndex(1), SceneIndex(2)]
        );

        assert!(registry.remove(SceneIndex(1)).is_some());
        let next = registry.add("again", GenerationParams::default()).unwrap();
        assert_eq!(next, SceneIndex(1));
    }

    #[test]
    fn test_capacity() {
        let mut registry = registry_with(MAX_SCENES);
        assert_eq!(
            registry.add("one too many", GenerationParams::default()),
            Err(RegistryError::CapacityExceeded(MAX_SCENES))
        );
    }

    #[test]
    fn test_gate_requires_two_ready_scenes() {
        let mut registry = SceneRegistry::new();
        assert!(!registry.can_concatenate());

        let a = registry.add("a", GenerationParams::default()).unwrap();
        finish(&mut registry, a);
        assert!(!registry.can_concatenate());

        let b = registry.add("b", GenerationParams::default()).unwrap();
        assert!(!registry.can_concatenate());

        let submission = registry.mark_submitted(b).unwrap();
        assert!(!registry.can_concatenate());
        assert!(registry.mark_polling(b, submission, JobId::from_string("job-b")));
        assert!(!registry.can_concatenate());
        assert!(registry.mark_ready(b, submission, PathBuf::from("/tmp/b.mp4")));
        assert!(registry.can_concatenate());

        assert_eq!(
            registry.snapshot_ordered_artifacts(),
            vec![PathBuf::from("/tmp/scene_1.mp4"), PathBuf::from("/tmp/b.mp4")]
        );
    }

    #[test]
    fn test_failed_scene_blocks_gate() {
        let mut registry = registry_with(2);
        finish(&mut registry, SceneIndex(0));
        let submission = registry.mark_submitted(SceneIndex(1)).unwrap();
        assert!(registry.mark_failed(SceneIndex(1), submission, "Job didn't succeed. Status: failed"));

        assert!(!registry.can_concatenate());
        assert_eq!(
            registry.blocking(),
            vec![(SceneIndex(1), SceneStatus::Failed)]
        );
    }

    #[test]
    fn test_late_ready_after_removal_is_noop() {
        let mut registry = registry_with(3);
        finish(&mut registry, SceneIndex(0));
        let submission = registry.mark_submitted(SceneIndex(1)).unwrap();

        registry.remove(SceneIndex(1));
        assert!(!registry.mark_ready(SceneIndex(1), submission, PathBuf::from("/tmp/late.mp4")));
        assert!(registry.get(SceneIndex(1)).is_none());
        assert_eq!(
            registry.snapshot_ordered_artifacts(),
            vec![PathBuf::from("/tmp/scene_1.mp4")]
        );

        // A new scene in the reused slot does not accept the old submission either.
        registry.add("replacement", GenerationParams::default()).unwrap();
        assert!(!registry.mark_ready(SceneIndex(1), submission, PathBuf::from("/tmp/late.mp4")));
        assert_eq!(
            registry.get(SceneIndex(1)).unwrap().status,
            SceneStatus::Idle
        );
    }

    #[test]
    fn test_stale_submission_rejected() {
        let mut registry = registry_with(3);
        let index = SceneIndex(2);

        let first = registry.mark_submitted(index).unwrap();
        assert!(registry.mark_polling(index, first, JobId::from_string("job-1")));

        let second = registry.mark_submitted(index).unwrap();
        assert_ne!(first, second);
        assert!(registry.mark_ready(index, second, PathBuf::from("/tmp/second.mp4")));

        assert!(!registry.mark_ready(index, first, PathBuf::from("/tmp/first.mp4")));
        assert!(!registry.mark_failed(index, first, "late failure"));

        let scene = registry.get(index).unwrap();
        assert_eq!(scene.status, SceneStatus::Ready);
        assert_eq!(scene.artifact_path, Some(PathBuf::from("/tmp/second.mp4")));
    }

    #[test]
    fn test_terminal_write_requires_in_flight() {
        let mut registry = registry_with(1);
        let submission = finish(&mut registry, SceneIndex(0));
        assert!(!registry.mark_failed(SceneIndex(0), submission, "twice"));
        assert!(!registry.mark_polling(SceneIndex(0), submission, JobId::from_string("j")));
        assert!(registry.get(SceneIndex(0)).unwrap().is_ready());
    }

    #[test]
    fn test_edit_resets_ready_scene() {
        let mut registry = registry_with(2);
        finish(&mut registry, SceneIndex(0));
        finish(&mut registry, SceneIndex(1));
        assert!(registry.can_concatenate());
        let revision = registry.revision();

        registry.set_text(SceneIndex(0), "rewritten").unwrap();
        assert!(!registry.can_concatenate());
        assert!(registry.revision() > revision);
        assert_eq!(
            registry.set_text(SceneIndex(7), "missing"),
            Err(RegistryError::NotFound(SceneIndex(7)))
        );
    }

    #[tokio::test]
    async fn test_events_published() {
        let mut registry = SceneRegistry::new();
        let mut events = registry.subscribe();

        let index = registry.add("a", GenerationParams::default()).unwrap();
        let submission = registry.mark_submitted(index).unwrap();
        registry.mark_failed(index, submission, "boom");

        assert_eq!(
            events.recv().await.unwrap(),
            SceneEvent::list_changed(vec![index])
        );
        match events.recv().await.unwrap() {
            SceneEvent::SceneStatusChanged { status, .. } => {
                assert_eq!(status, SceneStatus::Submitted)
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match events.recv().await.unwrap() {
            SceneEvent::SceneStatusChanged {
                status, message, ..
            } => {
                assert_eq!(status, SceneStatus::Failed);
                assert_eq!(message.as_deref(), Some("boom"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
