//! Drives one remote video-generation job to a terminal state.
//!
//! The loop submits once, then queries status with exponential backoff until
//! the job reaches `succeeded`, `failed` or `cancelled`, the wall-clock
//! timeout passes, or the cancel signal fires. On success the first
//! generation is downloaded to the caller-chosen artifact path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reel_models::{GenerationId, GenerationJob, GenerationRequest, JobId, RemoteJobStatus};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AiError, AiResult};
use crate::video::VideoGenerationApi;

/// Poll loop timing.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wait before the first status query
    pub interval: Duration,
    /// Factor applied to the wait after every query
    pub backoff_multiplier: f64,
    /// Upper bound for a single wait
    pub max_interval: Duration,
    /// Total wall-clock budget for one job
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            max_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(20 * 60),
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: env_secs("POLL_INTERVAL_SECS").unwrap_or(defaults.interval),
            backoff_multiplier: std::env::var("POLL_BACKOFF_MULTIPLIER")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|m| m.is_finite() && *m >= 1.0)
                .unwrap_or(defaults.backoff_multiplier),
            max_interval: env_secs("POLL_MAX_INTERVAL_SECS").unwrap_or(defaults.max_interval),
            timeout: env_secs("POLL_TIMEOUT_SECS").unwrap_or(defaults.timeout),
        }
    }

    /// Wait before status query number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.interval.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key).ok().as_deref().and_then(positive_secs)
}

/// Zero would busy-poll (interval) or fail before the first poll (timeout).
fn positive_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Local view of the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Submitted,
    Queued,
    FetchingArtifact,
    Done,
    Failed,
}

/// Progress notification emitted while a job is driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The service accepted the job
    Submitted { job_id: JobId },
    /// A status query returned
    StatusChanged {
        status: RemoteJobStatus,
        attempt: u32,
    },
    /// The job succeeded and its content is being downloaded
    FetchingArtifact { generation_id: GenerationId },
    /// The loop ended
    Finished { state: PollerState },
}

impl PollEvent {
    /// Poller state after this event.
    pub fn state(&self) -> PollerState {
        match self {
            PollEvent::Submitted { .. } => PollerState::Submitted,
            PollEvent::StatusChanged { .. } => PollerState::Queued,
            PollEvent::FetchingArtifact { .. } => PollerState::FetchingArtifact,
            PollEvent::Finished { state } => *state,
        }
    }
}

/// Callback receiving [`PollEvent`]s.
pub type PollObserver = Arc<dyn Fn(PollEvent) + Send + Sync>;

/// Observer that ignores every event.
pub fn noop_observer() -> PollObserver {
    Arc::new(|_: PollEvent| {})
}

/// Runs the submit / poll / fetch protocol for one job.
pub struct JobPoller {
    api: Arc<dyn VideoGenerationApi>,
    config: PollConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl JobPoller {
    pub fn new(api: Arc<dyn VideoGenerationApi>, config: PollConfig) -> Self {
        Self {
            api,
            config,
            cancel: None,
        }
    }

    /// Stop polling with [`AiError::Cancelled`] once `cancel` turns `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Drive one job to completion and write its video to `artifact`.
    ///
    /// Returns `Ok(None)` when the job succeeded but the content download
    /// was refused by the service.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        artifact: &Path,
        observer: &PollObserver,
    ) -> AiResult<Option<PathBuf>> {
        let result = self.drive(request, artifact, observer).await;
        let state = match &result {
            Ok(Some(_)) => PollerState::Done,
            _ => PollerState::Failed,
        };
        observer(PollEvent::Finished { state });
        result
    }

    async fn drive(
        &self,
        request: &GenerationRequest,
        artifact: &Path,
        observer: &PollObserver,
    ) -> AiResult<Option<PathBuf>> {
        let mut cancel = self.cancel.clone();
        check_cancelled(&cancel)?;

        let job_id = self.api.submit_job(request).await?;
        info!(job_id = %job_id, "Video job submitted");
        observer(PollEvent::Submitted {
            job_id: job_id.clone(),
        });

        let deadline = Instant::now() + self.config.timeout;
        let mut job = GenerationJob::new(job_id);

        let status = loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    job_id = %job.job_id,
                    attempts = job.poll_attempts,
                    "Video job timed out"
                );
                return Err(AiError::Timeout(self.config.timeout.as_secs()));
            }

            let delay = self
                .config
                .delay_for_attempt(job.poll_attempts)
                .min(deadline - now);
            pause(delay, &mut cancel).await?;

            let response = self.api.job_status(&job.job_id).await?;
            job.record_poll(response.status);
            debug!(
                job_id = %job.job_id,
                status = %response.status,
                attempt = job.poll_attempts,
                "Polled video job"
            );
            observer(PollEvent::StatusChanged {
                status: response.status,
                attempt: job.poll_attempts,
            });

            if response.status.is_terminal() {
                break response;
            }
        };

        if status.status.is_failure() {
            warn!(job_id = %job.job_id, status = %status.status, "Video job did not succeed");
            return Err(AiError::JobFailed {
                status: status.status,
                reason: status.failure_reason,
            });
        }

        let generation_id = status
            .first_generation()
            .cloned()
            .ok_or_else(|| AiError::NoArtifact(job.job_id.clone()))?;
        observer(PollEvent::FetchingArtifact {
            generation_id: generation_id.clone(),
        });

        let Some(bytes) = self.api.fetch_content(&generation_id).await? else {
            return Ok(None);
        };

        if let Some(parent) = artifact.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(artifact, &bytes).await?;

        info!(
            job_id = %job.job_id,
            path = %artifact.display(),
            bytes = bytes.len(),
            "Video artifact saved"
        );
        Ok(Some(artifact.to_path_buf()))
    }
}

fn check_cancelled(cancel: &Option<watch::Receiver<bool>>) -> AiResult<()> {
    match cancel {
        Some(rx) if *rx.borrow() => Err(AiError::Cancelled),
        _ => Ok(()),
    }
}

/// Sleep for `delay`, returning early with `Cancelled` if the signal fires.
async fn pause(delay: Duration, cancel: &mut Option<watch::Receiver<bool>>) -> AiResult<()> {
    let Some(rx) = cancel else {
        tokio::time::sleep(delay).await;
        return Ok(());
    };
    if *rx.borrow() {
        return Err(AiError::Cancelled);
    }

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = rx.changed() => {
                if changed.is_err() {
                    // Sender gone; nothing can cancel us any more.
                    (&mut sleep).await;
                    return Ok(());
                }
                if *rx.borrow() {
                    return Err(AiError::Cancelled);
                }
            }
        }
    }
}
