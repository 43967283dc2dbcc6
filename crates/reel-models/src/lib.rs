//! Shared data models for Reelsmith.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes, their generation status and submission identity
//! - Generation parameters (duration, resolution presets)
//! - Remote video-generation jobs
//! - Combined (concatenated) videos
//! - Notifications published to the presentation layer

pub mod combined;
pub mod event;
pub mod job;
pub mod params;
pub mod scene;

// Re-export common types
pub use combined::CombinedVideo;
pub use event::SceneEvent;
pub use job::{GenerationId, GenerationJob, GenerationRequest, JobId, RemoteJobStatus};
pub use params::{
    validate_scene_count, GenerationParams, ParamError, Resolution, MAX_DURATION_SECONDS,
    MAX_SCENE_COUNT, MIN_DURATION_SECONDS, MIN_SCENE_COUNT,
};
pub use scene::{Scene, SceneIndex, SceneStatus, SubmissionId};
