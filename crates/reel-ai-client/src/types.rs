//! Service request/response types.

use reel_models::{GenerationId, GenerationRequest, RemoteJobStatus};
use serde::{Deserialize, Serialize};

/// Body of a video job submission.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VideoJobBody<'a> {
    pub prompt: &'a str,
    pub n_seconds: u32,
    pub width: u32,
    pub height: u32,
    pub model: &'a str,
}

impl<'a> VideoJobBody<'a> {
    pub fn new(request: &'a GenerationRequest, model: &'a str) -> Self {
        Self {
            prompt: &request.prompt,
            n_seconds: request.duration_seconds,
            width: request.width,
            height: request.height,
            model,
        }
    }
}

/// Response to a job submission.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitResponse {
    pub id: String,
}

/// One generation of a succeeded job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRef {
    pub id: GenerationId,
}

/// Response to a job status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub id: String,
    pub status: RemoteJobStatus,
    /// Present once the job has succeeded
    #[serde(default)]
    pub generations: Option<Vec<GenerationRef>>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl JobStatusResponse {
    pub fn new(status: RemoteJobStatus) -> Self {
        Self {
            id: String::new(),
            status,
            generations: None,
            failure_reason: None,
        }
    }

    pub fn with_generation(mut self, id: impl Into<String>) -> Self {
        self.generations
            .get_or_insert_with(Vec::new)
            .push(GenerationRef {
                id: GenerationId::from_string(id),
            });
        self
    }

    /// First generation of the result payload, if any.
    pub fn first_generation(&self) -> Option<&GenerationId> {
        self.generations
            .as_ref()
            .and_then(|g| g.first())
            .map(|g| &g.id)
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_parsing() {
        let json = r#"{"id":"task_1","status":"succeeded","generations":[{"id":"gen_1"},{"id":"gen_2"}]}"#;
        let resp: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, RemoteJobStatus::Succeeded);
        assert_eq!(resp.first_generation().unwrap().as_str(), "gen_1");
    }

    #[test]
    fn test_status_response_without_generations() {
        let resp: JobStatusResponse =
            serde_json::from_str(r#"{"id":"task_1","status":"succeeded","generations":[]}"#)
                .unwrap();
        assert!(resp.first_generation().is_none());

        let resp: JobStatusResponse = serde_json::from_str(r#"{"status":"running"}"#).unwrap();
        assert!(resp.first_generation().is_none());
    }

    #[test]
    fn test_job_body_fields() {
        let request = GenerationRequest {
            prompt: "A city.".to_string(),
            duration_seconds: 10,
            width: 1280,
            height: 720,
        };
        let body = serde_json::to_value(VideoJobBody::new(&request, "sora")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "prompt": "A city.",
                "n_seconds": 10,
                "width": 1280,
                "height": 720,
                "model": "sora"
            })
        );
    }
}
