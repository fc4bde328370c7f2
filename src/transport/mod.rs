//! HTTP transport
//!
//! One bounded-timeout JSON POST per call. The trait seam exists so the
//! fallback cascade and the form orchestrator can run against scripted
//! transports in tests without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use thiserror::Error;

use crate::payload::SubmissionPayload;

/// Outcome of a single POST attempt that produced an HTTP response.
///
/// A non-JSON body is not an error: plain-text error pages from proxies or
/// cold backends must not crash the cascade, so `body` degrades to `None`.
#[derive(Debug, Clone)]
pub struct AttemptResult {
    /// HTTP status code.
    pub status: u16,
    /// Whether the status was 2xx.
    pub ok: bool,
    /// Parsed JSON body, `None` when the body was empty or not JSON.
    pub body: Option<serde_json::Value>,
    /// Raw response body text, kept for operator diagnostics.
    pub text: String,
}

impl AttemptResult {
    /// The backend's success criterion: a JSON body with `success: true`.
    pub fn backend_success(&self) -> bool {
        matches!(
            self.body.as_ref().and_then(|b| b.get("success")),
            Some(serde_json::Value::Bool(true))
        )
    }

    /// Backend-provided user-facing text, if any: `error` preferred over
    /// `message`.
    pub fn backend_message(&self) -> Option<&str> {
        let body = self.body.as_ref()?;
        body.get("error")
            .or_else(|| body.get("message"))
            .and_then(|v| v.as_str())
    }
}

/// Transport failures: no HTTP response was produced at all.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The timeout budget elapsed before a response arrived; the in-flight
    /// request was cancelled.
    #[error("request timed out")]
    Timeout,

    /// Any other network-level failure (DNS, refused connection, reset...).
    #[error("network error: {0}")]
    Connect(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

/// A sink for one JSON submission attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` as JSON to `url`, failing with [`TransportError::Timeout`]
    /// when no response arrives within `timeout`.
    async fn post_json(
        &self,
        url: &str,
        payload: &SubmissionPayload,
        timeout: Duration,
    ) -> Result<AttemptResult, TransportError>;
}

/// Real transport over a shared reqwest client.
///
/// Timeouts are set per request so one client serves every budget in the
/// cascade (moderate primary, extended retry, per-fallback).
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .build()
            .unwrap_or_else(|_| Client::new());
        HttpTransport { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        payload: &SubmissionPayload,
        timeout: Duration,
    ) -> Result<AttemptResult, TransportError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        // Read the full body as text first; JSON parsing is tolerant.
        let text = response.text().await.map_err(classify)?;

        Ok(AttemptResult {
            status: status.as_u16(),
            ok: status.is_success(),
            body: parse_body(&text),
            text,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(err.to_string())
    }
}

/// Tolerant JSON parse: empty or malformed bodies yield `None`.
fn parse_body(text: &str) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}
