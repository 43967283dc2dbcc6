//! Video-generation service client.

use async_trait::async_trait;
use reel_models::{GenerationId, GenerationRequest, JobId};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{AiError, AiResult};
use crate::types::{JobStatusResponse, SubmitResponse, VideoJobBody};

/// The three operations of the video-generation service.
#[async_trait]
pub trait VideoGenerationApi: Send + Sync {
    /// Submit one generation job and return its id.
    async fn submit_job(&self, request: &GenerationRequest) -> AiResult<JobId>;

    /// Query the status of a job.
    async fn job_status(&self, job_id: &JobId) -> AiResult<JobStatusResponse>;

    /// Download the video of one generation.
    ///
    /// Returns `Ok(None)` when the service answers with a non-success status.
    async fn fetch_content(&self, generation_id: &GenerationId) -> AiResult<Option<Vec<u8>>>;
}

/// HTTP client for the video-generation service.
pub struct VideoClient {
    http: Client,
    config: ServiceConfig,
}

impl VideoClient {
    pub fn new(config: ServiceConfig) -> AiResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AiError::Network)?;

        Ok(Self { http, config })
    }

    fn generations_url(&self) -> String {
        format!("{}/openai/v1/video/generations", self.config.base_url())
    }

    fn api_version(&self) -> [(&str, &str); 1] {
        [("api-version", self.config.video_api_version.as_str())]
    }
}

#[async_trait]
impl VideoGenerationApi for VideoClient {
    async fn submit_job(&self, request: &GenerationRequest) -> AiResult<JobId> {
        let url = format!("{}/jobs", self.generations_url());
        let body = VideoJobBody::new(request, &self.config.video_model);

        debug!("Submitting video job to {}", url);

        let response = self
            .http
            .post(&url)
            .query(&self.api_version())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request_failed(status.as_u16(), body));
        }

        let submitted: SubmitResponse = response.json().await?;
        if submitted.id.is_empty() {
            return Err(AiError::invalid_response("Job submission returned an empty id"));
        }
        Ok(JobId::from_string(submitted.id))
    }

    async fn job_status(&self, job_id: &JobId) -> AiResult<JobStatusResponse> {
        let url = format!("{}/jobs/{}", self.generations_url(), job_id);

        let response = self
            .http
            .get(&url)
            .query(&self.api_version())
            .header("api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request_failed(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }

    async fn fetch_content(&self, generation_id: &GenerationId) -> AiResult<Option<Vec<u8>>> {
        let url = format!("{}/{}/content/video", self.generations_url(), generation_id);

        let response = self
            .http
            .get(&url)
            .query(&self.api_version())
            .header("api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                generation_id = %generation_id,
                "Video content request returned {}",
                response.status()
            );
            return Ok(None);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}
