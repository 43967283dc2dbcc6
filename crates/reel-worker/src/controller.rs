//! Orchestration of scene generation, per-scene jobs and the final merge.
//!
//! The controller is the only entry point a front end calls. It owns the
//! [`SceneRegistry`] behind a lock that is never held across an await, spawns
//! one task per submission, and serializes combines with a process-wide flag.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reel_ai_client::{
    JobPoller, PollConfig, PollEvent, PollObserver, TextGenerator, VideoGenerationApi,
};
use reel_media::{copy_file, ConcatConfig, VideoConcatenator};
use reel_models::{
    CombinedVideo, GenerationParams, GenerationRequest, Scene, SceneEvent, SceneIndex,
    SceneStatus, SubmissionId,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use crate::config::ReelConfig;
use crate::error::{ReelError, ReelResult};
use crate::logging::SceneLogger;
use crate::registry::{RegistryError, SceneRegistry};
use crate::scene_generator::SceneGenerator;

type SharedRegistry = Arc<RwLock<SceneRegistry>>;

fn read_registry(registry: &RwLock<SceneRegistry>) -> RwLockReadGuard<'_, SceneRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_registry(registry: &RwLock<SceneRegistry>) -> RwLockWriteGuard<'_, SceneRegistry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the combine flag when a combine ends, however it ends.
struct CombineGuard<'a>(&'a AtomicBool);

impl Drop for CombineGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct OrchestrationController {
    config: ReelConfig,
    generator: SceneGenerator,
    video_api: Arc<dyn VideoGenerationApi>,
    poll_config: PollConfig,
    concatenator: VideoConcatenator,
    registry: SharedRegistry,
    combining: AtomicBool,
    combined: Mutex<Option<CombinedVideo>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OrchestrationController {
    pub fn new(
        config: ReelConfig,
        text: Arc<dyn TextGenerator>,
        video_api: Arc<dyn VideoGenerationApi>,
        poll_config: PollConfig,
        concat_config: ConcatConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            generator: SceneGenerator::new(text),
            video_api,
            poll_config,
            concatenator: VideoConcatenator::new(concat_config),
            registry: Arc::new(RwLock::new(SceneRegistry::new())),
            combining: AtomicBool::new(false),
            combined: Mutex::new(None),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    /// Subscribe to scene and combine notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        read_registry(&self.registry).subscribe()
    }

    /// Copy of every live scene in ascending index order.
    pub fn snapshot(&self) -> Vec<Scene> {
        read_registry(&self.registry).scenes().cloned().collect()
    }

    /// Generate `count` scenes for `prompt`, replacing the current scene set.
    ///
    /// Pollers of replaced scenes keep running but their results are dropped.
    pub async fn generate_scenes(
        &self,
        prompt: &str,
        count: usize,
        params: GenerationParams,
    ) -> ReelResult<Vec<SceneIndex>> {
        params.validate()?;
        let texts = self.generator.generate(prompt, count).await?;

        let mut registry = write_registry(&self.registry);
        registry.clear();
        let indices = texts
            .into_iter()
            .map(|text| registry.add(text, params))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = indices.len(), "Scene set replaced");
        Ok(indices)
    }

    /// Add a scene with the default parameters.
    pub fn add_scene(&self, text: impl Into<String>) -> ReelResult<SceneIndex> {
        let index = write_registry(&self.registry).add(text, self.config.default_params)?;
        Ok(index)
    }

    pub fn remove_scene(&self, index: SceneIndex) -> ReelResult<Scene> {
        write_registry(&self.registry)
            .remove(index)
            .ok_or_else(|| RegistryError::NotFound(index).into())
    }

    pub fn set_scene_text(&self, index: SceneIndex, text: impl Into<String>) -> ReelResult<()> {
        write_registry(&self.registry).set_text(index, text)?;
        Ok(())
    }

    pub fn set_scene_params(&self, index: SceneIndex, params: GenerationParams) -> ReelResult<()> {
        params.validate()?;
        write_registry(&self.registry).set_params(index, params)?;
        Ok(())
    }

    /// Start a video job for one scene.
    ///
    /// A submission already in flight for the scene is superseded: its
    /// eventual result is ignored.
    pub fn submit_scene(&self, index: SceneIndex) -> ReelResult<SubmissionId> {
        let (submission, request) = {
            let mut registry = write_registry(&self.registry);
            let scene = registry
                .get(index)
                .ok_or(RegistryError::NotFound(index))?;
            if scene.text.trim().is_empty() {
                return Err(ReelError::input(format!(
                    "Scene {} has no text",
                    index.number()
                )));
            }
            let request = GenerationRequest::new(scene.text.clone(), &scene.params);
            (registry.mark_submitted(index)?, request)
        };

        let artifact = self
            .config
            .scratch_dir
            .join(format!("scene_{}_{}.mp4", index.number(), submission));
        let logger = SceneLogger::new(index, "video_generation").with_submission(submission);
        let span = logger.create_span();

        let task = SubmissionTask {
            registry: Arc::clone(&self.registry),
            poller: JobPoller::new(Arc::clone(&self.video_api), self.poll_config.clone())
                .with_cancel(self.shutdown.subscribe()),
            index,
            submission,
            request,
            artifact,
            logger,
        };
        let handle = tokio::spawn(task.run().instrument(span));

        let mut tasks = lock(&self.tasks);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);

        Ok(submission)
    }

    /// Submit every scene that is neither in flight nor finished.
    ///
    /// All pending scenes are checked first; if any has blank text, nothing
    /// is started and the error names every blank scene.
    pub fn submit_all(&self) -> ReelResult<Vec<SubmissionId>> {
        let (pending, blank) = {
            let registry = read_registry(&self.registry);
            let mut pending = Vec::new();
            let mut blank = Vec::new();
            for scene in registry
                .scenes()
                .filter(|s| !s.status.is_in_flight() && !s.is_ready())
            {
                if scene.text.trim().is_empty() {
                    blank.push(scene.index.number().to_string());
                } else {
                    pending.push(scene.index);
                }
            }
            (pending, blank)
        };

        match blank.as_slice() {
            [] => {}
            [one] => return Err(ReelError::input(format!("Scene {} has no text", one))),
            many => {
                return Err(ReelError::input(format!(
                    "Scenes {} have no text",
                    many.join(", ")
                )))
            }
        }

        pending
            .into_iter()
            .map(|index| self.submit_scene(index))
            .collect()
    }

    /// Wait until no submission is in flight, then report whether the gate
    /// is open.
    pub async fn wait_for_gate(&self) -> ReelResult<()> {
        let mut events = self.subscribe();
        loop {
            {
                let registry = read_registry(&self.registry);
                if !registry.has_in_flight() {
                    return gate_result(&registry);
                }
            }
            match events.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return gate_result(&read_registry(&self.registry));
                }
            }
        }
    }

    /// Merge all scene videos, in index order, into `output`.
    pub async fn combine(&self, output: &Path) -> ReelResult<CombinedVideo> {
        if self
            .combining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ReelError::CombineInProgress);
        }
        let _guard = CombineGuard(&self.combining);

        let (sources, revision) = {
            let registry = read_registry(&self.registry);
            gate_result(&registry)?;
            (registry.snapshot_ordered_artifacts(), registry.revision())
        };

        info!(
            scenes = sources.len(),
            output = %output.display(),
            "Combining scene videos"
        );
        let output = self.concatenator.combine(&sources, output).await?;

        let combined = CombinedVideo::new(sources, output.clone(), revision);
        *lock(&self.combined) = Some(combined.clone());
        read_registry(&self.registry).notify_combine_ready(&output);

        Ok(combined)
    }

    /// Combine into the scratch directory for preview.
    pub async fn preview(&self) -> ReelResult<CombinedVideo> {
        let output = self.config.preview_path();
        self.combine(&output).await
    }

    /// The last combined video, if no scene changed since it was built.
    pub fn combined_video(&self) -> Option<CombinedVideo> {
        let revision = read_registry(&self.registry).revision();
        lock(&self.combined)
            .as_ref()
            .filter(|c| c.is_current(revision))
            .cloned()
    }

    /// Copy a finished scene video to `dest`.
    pub async fn export_scene(&self, index: SceneIndex, dest: &Path) -> ReelResult<PathBuf> {
        let source = {
            let registry = read_registry(&self.registry);
            let scene = registry
                .get(index)
                .ok_or(RegistryError::NotFound(index))?;
            scene
                .artifact_path
                .clone()
                .filter(|_| scene.is_ready())
                .ok_or(ReelError::SceneNotReady(index))?
        };
        copy_file(&source, dest).await?;
        Ok(dest.to_path_buf())
    }

    /// Copy the current combined video to `dest`.
    pub async fn export_combined(&self, dest: &Path) -> ReelResult<PathBuf> {
        let combined = self.combined_video().ok_or(ReelError::NoCombinedVideo)?;
        copy_file(&combined.output_path, dest).await?;
        Ok(dest.to_path_buf())
    }

    /// Cancel every in-flight poll loop and wait for the tasks to end.
    ///
    /// Submissions made after this are cancelled before they reach the service.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let handles = std::mem::take(&mut *lock(&self.tasks));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Scene task ended abnormally: {}", e);
            }
        }
    }
}

/// Progress line for a poller event; terminal events are logged by the task.
fn poll_progress(event: &PollEvent) -> Option<String> {
    match event {
        PollEvent::Submitted { job_id } => Some(format!("submitted as job {}", job_id)),
        PollEvent::StatusChanged { status, attempt } => {
            Some(format!("remote status {} (poll {})", status, attempt))
        }
        PollEvent::FetchingArtifact { .. } => Some("downloading video".to_string()),
        PollEvent::Finished { .. } => None,
    }
}

fn gate_result(registry: &SceneRegistry) -> ReelResult<()> {
    if registry.can_concatenate() {
        return Ok(());
    }
    if registry.len() < 2 {
        return Err(ReelError::GateClosed(format!(
            "at least 2 scenes are required, found {}",
            registry.len()
        )));
    }
    let blocking = registry
        .blocking()
        .into_iter()
        .map(|(index, status)| format!("scene {} is {}", index.number(), status))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ReelError::GateClosed(blocking))
}

/// One submission, owned by its own task.
struct SubmissionTask {
    registry: SharedRegistry,
    poller: JobPoller,
    index: SceneIndex,
    submission: SubmissionId,
    request: GenerationRequest,
    artifact: PathBuf,
    logger: SceneLogger,
}

impl SubmissionTask {
    async fn run(self) {
        let Self {
            registry,
            poller,
            index,
            submission,
            request,
            artifact,
            logger,
        } = self;

        logger.log_start(&format!(
            "{}s at {}x{}",
            request.duration_seconds, request.width, request.height
        ));

        let observer: PollObserver = {
            let registry = Arc::clone(&registry);
            let logger = logger.clone();
            Arc::new(move |event: PollEvent| {
                if let Some(message) = poll_progress(&event) {
                    logger.log_progress(&message);
                }
                if let PollEvent::Submitted { job_id } = event {
                    write_registry(&registry).mark_polling(index, submission, job_id);
                }
            })
        };

        let outcome = poller.run(&request, &artifact, &observer).await;

        let (accepted, status, message) = {
            let mut registry = write_registry(&registry);
            match outcome {
                Ok(Some(path)) => (
                    registry.mark_ready(index, submission, path),
                    SceneStatus::Ready,
                    artifact.display().to_string(),
                ),
                Ok(None) => {
                    let reason = ReelError::NoArtifact(index).to_string();
                    (
                        registry.mark_failed(index, submission, reason.clone()),
                        SceneStatus::Failed,
                        reason,
                    )
                }
                Err(e) => {
                    let reason = e.to_string();
                    (
                        registry.mark_failed(index, submission, reason.clone()),
                        SceneStatus::Failed,
                        reason,
                    )
                }
            }
        };

        match (accepted, status) {
            (false, _) => {
                logger.log_warning("Result discarded, submission superseded or scene removed")
            }
            (true, SceneStatus::Ready) => logger.log_completion(&message),
            (true, _) => logger.log_error(&message),
        }
    }
}
