#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for merging scene videos.
//!
//! This crate provides:
//! - Merge tool location (configured path or `PATH` lookup)
//! - Ordered concat manifests with scoped cleanup
//! - Stream-copy concatenation with full stderr capture
//! - Artifact export helpers

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;

pub use command::{locate_tool, run_tool, ConcatCommand, ToolOutput};
pub use concat::{manifest_body, ConcatConfig, VideoConcatenator};
pub use error::{MediaError, MediaResult};
pub use fs_utils::copy_file;
