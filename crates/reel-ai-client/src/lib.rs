//! Clients for the remote AI services.
//!
//! This crate provides:
//! - A chat-completion client used to turn a prompt into scene text
//! - A video-generation client (submit job, poll status, fetch content)
//! - [`JobPoller`], which drives one video job to a terminal state
//!
//! Both services sit behind traits so orchestration code and tests can swap
//! in other implementations.

pub mod config;
pub mod error;
pub mod poller;
pub mod text;
pub mod types;
pub mod video;


pub use config::ServiceConfig;
pub use error::{AiError, AiResult};
pub use poller::{noop_observer, JobPoller, PollConfig, PollEvent, PollObserver, PollerState};
pub use text::{ChatCompletionClient, TextGenerator};
pub use types::{GenerationRef, JobStatusResponse};
pub use video::{VideoClient, VideoGenerationApi};
