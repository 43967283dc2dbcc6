//! Scene orchestration for Reelsmith.
//!
//! This crate wires the pieces together:
//! - [`SceneGenerator`] turns one prompt into ordered scene texts
//! - [`SceneRegistry`] owns every scene's status and artifact
//! - [`OrchestrationController`] submits scenes, gates and runs the merge

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod registry;
pub mod scene_generator;

pub use config::ReelConfig;
pub use controller::OrchestrationController;
pub use error::{ErrorKind, ReelError, ReelResult};
pub use logging::SceneLogger;
pub use registry::{RegistryError, SceneRegistry, MAX_SCENES};
pub use scene_generator::{build_instructions, pad_scenes, split_scenes, SceneGenerator};
