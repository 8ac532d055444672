//! ConfigGateway trait — the only boundary between the sync pipeline and the
//! gateway. `GatewayClient` is the HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{Result, SyncError};
use crate::model::Envelope;

/// How the gateway took a submitted spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// 200 — applied synchronously.
    Applied,
    /// 202 — queued for asynchronous processing on the gateway.
    Queued,
}

#[async_trait]
pub trait ConfigGateway: Send + Sync {
    /// GET a list endpoint and return the `result` array of its envelope.
    async fn list(
        &self,
        path: &str,
        params: &[(&str, &str)],
        credential: &str,
    ) -> Result<Vec<Value>>;

    /// POST a body to an apply endpoint.
    async fn submit(&self, path: &str, credential: &str, body: &Value) -> Result<SubmitStatus>;
}

/// HTTP client for the config gateway, rooted at a configured base address.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base: Url,
    http: reqwest::Client,
}

/// Raw outcome of a gateway call that returned a 2xx status.
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl GatewayClient {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    /// Bound every single call; the per-migration deadline still applies on top.
    pub fn with_timeout(base: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self { base, http })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Issue one request. Non-2xx statuses become `SyncError::Gateway` with the
    /// body's `error` field; connection failures become `SyncError::Transport`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        credential: Option<&str>,
        body: Option<&Value>,
    ) -> Result<GatewayResponse> {
        let url = self.url_for(path);
        let mut req = self.http.request(method.clone(), &url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(token) = credential.filter(|t| !t.is_empty()) {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, path, "gateway request");
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            tracing::error!(%method, path, status = status.as_u16(), error = %message, "gateway rejected request");
            return Err(SyncError::gateway(status.as_u16(), message));
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                SyncError::InvalidSpec(format!("undecodable gateway response from {path}: {e}"))
            })?
        };
        Ok(GatewayResponse { status, body })
    }
}

fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    serde_json::from_slice::<Envelope>(bytes)
        .ok()
        .and_then(|env| env.error)
        .unwrap_or_else(|| format!("gateway responded with {status}"))
}

#[async_trait]
impl ConfigGateway for GatewayClient {
    async fn list(
        &self,
        path: &str,
        params: &[(&str, &str)],
        credential: &str,
    ) -> Result<Vec<Value>> {
        let resp = self
            .request(Method::GET, path, params, Some(credential), None)
            .await?;
        if resp.body.is_null() {
            return Ok(Vec::new());
        }
        let envelope: Envelope = serde_json::from_value(resp.body).map_err(|e| {
            SyncError::InvalidSpec(format!("unexpected list envelope from {path}: {e}"))
        })?;
        Ok(envelope.result.unwrap_or_default())
    }

    async fn submit(&self, path: &str, credential: &str, body: &Value) -> Result<SubmitStatus> {
        let resp = self
            .request(Method::POST, path, &[], Some(credential), Some(body))
            .await?;
        match resp.status {
            StatusCode::OK => Ok(SubmitStatus::Applied),
            StatusCode::ACCEPTED => Ok(SubmitStatus::Queued),
            other => {
                let message = resp
                    .body
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("unexpected apply status {other}"));
                Err(SyncError::gateway(other.as_u16(), message))
            }
        }
    }
}
