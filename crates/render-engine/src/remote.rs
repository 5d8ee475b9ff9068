//! Client for the remote generation/render service.
//!
//! Covers the two server-side collaborators: code generation for
//! scripted assets, and offscreen render jobs polled to completion.

use std::time::Duration;

use cliplab_common::{CliplabError, CliplabResult};
use serde::{Deserialize, Serialize};

/// Lifecycle of a server-side render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Rendering,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Status report for one render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    code: String,
}

#[derive(Debug, Deserialize)]
struct StartRenderResponse {
    job_id: String,
}

/// HTTP client for the render service.
#[derive(Debug, Clone)]
pub struct RemoteJobClient {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteJobClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Generate asset source code from a prompt.
    pub async fn generate(&self, prompt: &str) -> CliplabResult<String> {
        let response: GenerateResponse = self
            .post_json("/generate", &GenerateRequest { prompt })
            .await?;
        Ok(response.code)
    }

    /// Kick off a render job; returns its id for polling. The render
    /// dimensions and duration travel as query parameters.
    pub async fn start_render(
        &self,
        width: u32,
        height: u32,
        duration: f64,
    ) -> CliplabResult<String> {
        let response = self
            .start_render_request(width, height, duration)
            .send()
            .await
            .map_err(|e| CliplabError::remote(format!("Render request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CliplabError::remote(format!("Render request rejected: {e}")))?;
        let response: StartRenderResponse = response
            .json()
            .await
            .map_err(|e| CliplabError::remote(format!("Malformed render response: {e}")))?;
        tracing::info!(job_id = %response.job_id, "Remote render job started");
        Ok(response.job_id)
    }

    fn start_render_request(
        &self,
        width: u32,
        height: u32,
        duration: f64,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/render", self.base_url);
        self.client.post(&url).query(&[
            ("width", width.to_string()),
            ("height", height.to_string()),
            ("duration", duration.to_string()),
        ])
    }

    pub async fn status(&self, job_id: &str) -> CliplabResult<JobStatus> {
        let url = format!("{}/status/{job_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CliplabError::remote(format!("Status request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CliplabError::remote(format!("Status request rejected: {e}")))?;
        response
            .json()
            .await
            .map_err(|e| CliplabError::remote(format!("Malformed status response: {e}")))
    }

    /// Request server-side cancellation of a job.
    pub async fn cancel(&self, job_id: &str) -> CliplabResult<()> {
        let url = format!("{}/cancel/{job_id}", self.base_url);
        self.client
            .post(&url)
            .send()
            .await
            .map_err(|e| CliplabError::remote(format!("Cancel request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CliplabError::remote(format!("Cancel request rejected: {e}")))?;
        Ok(())
    }

    /// Poll a job at a fixed interval until it reaches a terminal
    /// state. Returns the video URL on completion; a server-side
    /// `cancelled` maps to [`CliplabError::Cancelled`], `failed` to a
    /// render failure carrying the server's error message.
    pub async fn wait(
        &self,
        job_id: &str,
        poll_interval: Duration,
        mut progress: impl FnMut(f64),
    ) -> CliplabResult<String> {
        loop {
            let status = self.status(job_id).await?;
            progress(status.progress);
            if status.status.is_terminal() {
                return finish_job(status);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> CliplabResult<R>
    where
        B: Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CliplabError::remote(format!("Request to {path} failed: {e}")))?
            .error_for_status()
            .map_err(|e| CliplabError::remote(format!("Request to {path} rejected: {e}")))?;
        response
            .json()
            .await
            .map_err(|e| CliplabError::remote(format!("Malformed response from {path}: {e}")))
    }
}

/// Map a terminal status to the job outcome.
fn finish_job(status: JobStatus) -> CliplabResult<String> {
    match status.status {
        JobState::Completed => status.video_url.ok_or_else(|| {
            CliplabError::remote("Render job completed without a video URL")
        }),
        JobState::Cancelled => Err(CliplabError::Cancelled),
        JobState::Failed => Err(CliplabError::render(format!(
            "Remote render failed: {}",
            status.error.as_deref().unwrap_or("unknown error")
        ))),
        JobState::Queued | JobState::Rendering => Err(CliplabError::remote(
            "Render job polled as terminal while still running",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_deserializes_lowercase_states() {
        let status: JobStatus = serde_json::from_str(
            r#"{"status":"rendering","progress":0.4,"video_url":null,"error":null}"#,
        )
        .unwrap();
        assert_eq!(status.status, JobState::Rendering);
        assert!((status.progress - 0.4).abs() < 1e-9);
        assert!(!status.status.is_terminal());

        // Sparse payloads fall back to defaults.
        let sparse: JobStatus = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert_eq!(sparse.status, JobState::Queued);
        assert_eq!(sparse.progress, 0.0);
        assert!(sparse.video_url.is_none());
    }

    #[test]
    fn completed_job_yields_video_url() {
        let status = JobStatus {
            status: JobState::Completed,
            progress: 1.0,
            video_url: Some("https://renders.example/out.mp4".to_string()),
            error: None,
        };
        assert_eq!(
            finish_job(status).unwrap(),
            "https://renders.example/out.mp4"
        );
    }

    #[test]
    fn cancelled_job_maps_to_the_cancel_sentinel() {
        let status = JobStatus {
            status: JobState::Cancelled,
            progress: 0.2,
            video_url: None,
            error: None,
        };
        assert!(finish_job(status).unwrap_err().is_cancelled());
    }

    #[test]
    fn failed_job_carries_the_server_error() {
        let status = JobStatus {
            status: JobState::Failed,
            progress: 0.0,
            video_url: None,
            error: Some("GPU worker crashed".to_string()),
        };
        let err = finish_job(status).unwrap_err();
        assert!(err.to_string().contains("GPU worker crashed"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = RemoteJobClient::new("http://localhost:8787/");
        assert_eq!(client.base_url, "http://localhost:8787");
    }

    #[test]
    fn start_render_sends_dimensions_as_query_parameters() {
        let client = RemoteJobClient::new("http://localhost:8787");
        let request = client.start_render_request(1920, 1080, 5.5).build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8787/render?width=1920&height=1080&duration=5.5"
        );
    }
}
