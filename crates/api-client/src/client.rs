use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use pipeline_ui_core::config::{PipelineUiConfig, UrlBuilder};
use pipeline_ui_core::*;

use crate::error::ApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed HTTP client for the pipeline backend.
///
/// Every request carries `Content-Type: application/json` plus the static
/// headers from [`PipelineUiConfig::headers`].
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    websocket_url: Option<UrlBuilder>,
}

impl ApiClient {
    pub fn new(config: &PipelineUiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Self::with_client(client, config)
    }

    /// Use a caller-built `reqwest::Client` (proxies, custom TLS, shared pools).
    pub fn with_client(client: reqwest::Client, config: &PipelineUiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            headers,
            websocket_url: config.websocket_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access the underlying `reqwest::Client`.
    pub fn reqwest_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!(%method, %url, "api request");
        self.client.request(method, url).headers(self.headers.clone())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        parse_response(resp).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(req.json(body)).await
    }

    // ── Pipelines ─────────────────────────────────────────────────────────

    pub async fn start_pipeline(
        &self,
        req: &StartPipelineRequest,
    ) -> Result<StartPipelineResponse, ApiError> {
        self.send_json(self.request(Method::POST, self.url("/pipeline/start")), req)
            .await
    }

    pub async fn get_pipeline(&self, pipeline_id: &str) -> Result<PipelineSnapshot, ApiError> {
        self.send(self.request(Method::GET, self.url(&format!("/pipeline/{pipeline_id}"))))
            .await
    }

    pub async fn approve_pipeline(
        &self,
        pipeline_id: &str,
        approved: bool,
        feedback: Option<String>,
    ) -> Result<ApprovePipelineResponse, ApiError> {
        let body = ApprovalRequest { approved, feedback };
        self.send_json(
            self.request(
                Method::POST,
                self.url(&format!("/pipeline/{pipeline_id}/approve")),
            ),
            &body,
        )
        .await
    }

    pub async fn list_active_pipelines(&self) -> Result<ActivePipelinesResponse, ApiError> {
        self.send(self.request(Method::GET, self.url("/pipelines")))
            .await
    }

    // ── Sessions ──────────────────────────────────────────────────────────

    pub async fn list_sessions(
        &self,
        params: &ListSessionsParams,
    ) -> Result<ListSessionsResponse, ApiError> {
        let req = self
            .request(Method::GET, self.url("/sessions"))
            .query(&params.query_pairs());
        self.send(req).await
    }

    pub async fn get_session(
        &self,
        pipeline_id: &str,
        include_events: bool,
    ) -> Result<SessionDetail, ApiError> {
        let req = self
            .request(Method::GET, self.url(&format!("/sessions/{pipeline_id}")))
            .query(&[("includeEvents", include_events)]);
        self.send(req).await
    }

    pub async fn resumable_sessions(&self) -> Result<ResumableSessionsResponse, ApiError> {
        self.send(self.request(Method::GET, self.url("/sessions/resumable")))
            .await
    }

    pub async fn resume_session(
        &self,
        pipeline_id: &str,
        approved: bool,
        feedback: Option<String>,
    ) -> Result<ResumeSessionResponse, ApiError> {
        let body = ApprovalRequest { approved, feedback };
        self.send_json(
            self.request(
                Method::POST,
                self.url(&format!("/sessions/{pipeline_id}/resume")),
            ),
            &body,
        )
        .await
    }

    pub async fn delete_session(&self, pipeline_id: &str) -> Result<DeleteSessionResponse, ApiError> {
        self.send(self.request(Method::DELETE, self.url(&format!("/sessions/{pipeline_id}"))))
            .await
    }

    // ── Health ────────────────────────────────────────────────────────────

    /// Liveness probe; lives at `/health`, outside the `/api` prefix.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.send(self.request(Method::GET, format!("{}/health", self.base_url)))
            .await
    }

    // ── WebSocket ─────────────────────────────────────────────────────────

    /// Live-connection URL for a pipeline.
    ///
    /// A configured builder wins; otherwise the base URL's host is reused with
    /// `ws`/`wss` and the path `/ws/<id>`.
    pub fn websocket_url(&self, pipeline_id: &str) -> Result<String, ApiError> {
        if let Some(build) = &self.websocket_url {
            return Ok(build(pipeline_id));
        }
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let base = url::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        let host = base
            .host_str()
            .ok_or_else(|| invalid("missing host".into()))?;
        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        Ok(match base.port() {
            Some(port) => format!("{scheme}://{host}:{port}/ws/{pipeline_id}"),
            None => format!("{scheme}://{host}/ws/{pipeline_id}"),
        })
    }
}

async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }
    Ok(resp.json().await?)
}

/// Body `error` field, else `HTTP <code>` for JSON bodies, else the reason phrase.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let fallback = || format!("HTTP {}", status.as_u16());
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback),
        Err(_) => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(fallback),
    }
}
