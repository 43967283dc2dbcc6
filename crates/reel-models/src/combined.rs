//! Combined video (concatenation result).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A concatenation of scene artifacts, in scene order.
///
/// Only valid for the registry revision it was built from; any mutation that
/// can change the source set makes it stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedVideo {
    /// Sources as snapshotted when concatenation started
    pub source_paths: Vec<PathBuf>,
    /// Merged output file
    pub output_path: PathBuf,
    /// Registry revision the sources were taken from
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl CombinedVideo {
    pub fn new(source_paths: Vec<PathBuf>, output_path: PathBuf, revision: u64) -> Self {
        Self {
            source_paths,
            output_path,
            revision,
            created_at: Utc::now(),
        }
    }

    pub fn is_current(&self, revision: u64) -> bool {
        self.revision == revision
    }
}
