//! Notifications published to the presentation layer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{SceneIndex, SceneStatus};

/// Scene-level notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    /// Scenes were added or removed
    SceneListChanged {
        /// Live indices in ascending order
        indices: Vec<SceneIndex>,
    },

    /// A scene changed status
    SceneStatusChanged {
        index: SceneIndex,
        status: SceneStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A combined video is ready for preview or export
    CombineReady { output: PathBuf },
}

impl SceneEvent {
    pub fn list_changed(indices: Vec<SceneIndex>) -> Self {
        SceneEvent::SceneListChanged { indices }
    }

    pub fn status_changed(index: SceneIndex, status: SceneStatus, message: Option<String>) -> Self {
        SceneEvent::SceneStatusChanged {
            index,
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn combine_ready(output: impl Into<PathBuf>) -> Self {
        SceneEvent::CombineReady {
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SceneEvent::status_changed(SceneIndex(2), SceneStatus::Ready, None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "scene_status_changed");
        assert_eq!(json["index"], 2);
        assert_eq!(json["status"], "ready");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_list_changed_serialization() {
        let event = SceneEvent::list_changed(vec![SceneIndex(0), SceneIndex(1)]);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"scene_list_changed","indices":[0,1]}"#);
    }
}
