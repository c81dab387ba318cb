//! Network boundary.
//!
//! # Design
//! `Transport` is the one async seam in the crate: it takes a fully built
//! `HttpRequest` and returns the raw `HttpResponse`. Non-2xx statuses are
//! data, not errors; only failures that produce no response at all become
//! `TransportError`. Timeouts, pooling, and TLS live in the implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_POOL_MAX_IDLE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    /// The request could not be expressed on the wire (bad header, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    pool_max_idle_per_host: usize,
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

/// `Transport` over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE,
        }
    }

    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| TransportError::InvalidRequest(format!("header value for {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = header_map(&request.headers)?;
        let response = self
            .client
            .post(&request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse { status, headers, body })
    }
}
