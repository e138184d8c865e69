//! Typed access to the task API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use charisma_core::config::ClientConfig;
use charisma_entity::job::UnifiedJob;

use crate::error::ClientError;
use crate::models::{
    AnalysisRequest, BulkActionResult, ErrorBody, JobBody, JobsBody, SubmitBody, TaskListParams,
    TaskPage,
};

/// Byte chunks of an open event stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Analysis job operations used by the poller and the history panel.
#[async_trait]
pub trait AnalysisApi: Send + Sync + 'static {
    /// Queue an analysis and return its job id.
    async fn submit(&self, request: &AnalysisRequest) -> Result<Uuid, ClientError>;

    /// Current state of a job.
    async fn get_job(&self, job_id: Uuid) -> Result<UnifiedJob, ClientError>;

    /// Cancel a job.
    async fn cancel(&self, job_id: Uuid) -> Result<(), ClientError>;

    /// The caller's recent jobs, newest first.
    async fn recent_jobs(&self, limit: u64) -> Result<Vec<UnifiedJob>, ClientError>;
}

/// Something that opens a server-sent event stream.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Open a new stream.
    async fn connect(&self) -> Result<ByteStream, ClientError>;
}

/// reqwest-backed API client authenticated with a session token.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpAnalysisClient {
    /// Create a client for `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        // Streams stay open indefinitely, so the timeout is applied per request.
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            token: token.into(),
            http,
            request_timeout,
        })
    }

    /// Create a client from the client configuration section.
    pub fn from_config(config: &ClientConfig, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(
            config.base_url.clone(),
            token,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .timeout(self.request_timeout)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = checked(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_vec(body)?;
        self.send(
            builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }

    /// Admin: one page of jobs from both stores.
    pub async fn list_tasks(&self, params: &TaskListParams) -> Result<TaskPage, ClientError> {
        let url = self.url("/api/admin/background-tasks", &params.pairs())?;
        self.send(self.request(Method::GET, url)).await
    }

    /// Admin: apply a bulk action.
    pub async fn bulk_action(
        &self,
        action: &str,
        job_ids: &[Uuid],
        sources: Option<&[String]>,
    ) -> Result<BulkActionResult, ClientError> {
        let url = self.url("/api/admin/background-tasks", &[])?;
        let mut body = json!({ "action": action, "jobIds": job_ids });
        if let Some(sources) = sources {
            body["sources"] = json!(sources);
        }
        self.send_json(self.request(Method::POST, url), &body).await
    }
}

/// Turn non-success responses into `ClientError::Http`.
async fn checked(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    debug!(status = status.as_u16(), %message, "Request rejected");
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AnalysisApi for HttpAnalysisClient {
    async fn submit(&self, request: &AnalysisRequest) -> Result<Uuid, ClientError> {
        let url = self.url("/api/background/analyze", &[])?;
        let body: SubmitBody = self
            .send_json(self.request(Method::POST, url), request)
            .await?;
        Ok(body.job_id)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<UnifiedJob, ClientError> {
        let url = self.url("/api/background/analyze", &[("jobId", job_id.to_string())])?;
        let body: JobBody = self.send(self.request(Method::GET, url)).await?;
        Ok(body.job)
    }

    async fn cancel(&self, job_id: Uuid) -> Result<(), ClientError> {
        let url = self.url("/api/background/analyze", &[("jobId", job_id.to_string())])?;
        let _: serde_json::Value = self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn recent_jobs(&self, limit: u64) -> Result<Vec<UnifiedJob>, ClientError> {
        let url = self.url("/api/background/jobs", &[("limit", limit.to_string())])?;
        let body: JobsBody = self.send(self.request(Method::GET, url)).await?;
        Ok(body.jobs)
    }
}

#[async_trait]
impl EventSource for HttpAnalysisClient {
    async fn connect(&self) -> Result<ByteStream, ClientError> {
        let url = self.url("/api/notifications/stream", &[])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = checked(response).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed())
    }
}
