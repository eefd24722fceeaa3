//! REST/SSE client for the conversion service.
//!
//! Wraps the three endpoints the monitor needs (import submission,
//! notification registration, per-job event stream) using [`reqwest`].

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Url;

use demetsiiify_types::{ErrorBody, ImportRequest, Job, NotifyRequest};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::sse::SseDecoder;
use crate::streams::{JobStream, JobStreamSource};

/// HTTP client for one conversion service instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("demetsiiify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Result<Self, ClientError> {
        let invalid = |message: String| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message,
        };
        let parsed = Url::parse(config.base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute form of a server-relative link such as `/view/{id}`.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn job_stream_url(&self, job_id: &str) -> String {
        format!(
            "{}/api/tasks/{}/stream",
            self.base_url,
            urlencoding::encode(job_id)
        )
    }

    /// Submit a METS URL for conversion.
    ///
    /// Sends `POST /api/import` and returns the created job.
    pub async fn import(&self, request: &ImportRequest) -> Result<Job, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/import", self.base_url))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        let job: Job = Self::parse_response(response).await?;
        tracing::info!(job_id = %job.id, status = %job.status, url = %request.url, "import submitted");
        Ok(job)
    }

    /// Register a recipient for e-mail notification about `request.jobs`.
    ///
    /// Sends `POST /api/tasks/notify`; the response body is ignored.
    pub async fn notify(&self, request: &NotifyRequest) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/api/tasks/notify", self.base_url))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        tracing::info!(jobs = request.jobs.len(), "notification registered");
        Ok(())
    }

    // ---- private helpers ----

    /// Pass through 2xx responses; turn everything else into
    /// [`ClientError::Api`] with the parsed error body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let raw = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: ErrorBody::from_body(&raw),
                raw,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl JobStreamSource for ApiClient {
    /// `GET /api/tasks/{id}/stream`, decoded from server-sent events.
    fn open(&self, job_id: &str) -> JobStream {
        let request = self
            .client
            .get(self.job_stream_url(job_id))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        Box::pin(sse_jobs(request, job_id.to_string()))
    }
}

/// Every `message` event carries a full job snapshot. Other event names are
/// skipped.
fn sse_jobs(
    request: reqwest::RequestBuilder,
    job_id: String,
) -> impl Stream<Item = Result<Job, ClientError>> + Send + 'static {
    async_stream::try_stream! {
        let response = ApiClient::ensure_success(request.send().await?).await?;
        tracing::debug!(job_id = %job_id, "job stream connected");

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for event in decoder.feed(&chunk)? {
                if event.event != "message" {
                    tracing::trace!(job_id = %job_id, event = %event.event, "skipping event");
                    continue;
                }
                let job: Job = serde_json::from_str(&event.data)?;
                yield job;
            }
        }
    }
}
