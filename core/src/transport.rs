//! The seam between request building and the network.
//!
//! # Design
//! A `Transport` turns an `HttpRequest` into an `HttpResponse`. Non-2xx
//! responses are returned as data so that status interpretation stays in
//! `ResourceClient::parse_*`; only failures that produce no response at all
//! become `ApiError::Transport`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a blocking `ureq` agent.
///
/// Each request runs on tokio's blocking thread pool, so a runtime must be
/// active when `execute` is awaited.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|e| ApiError::TaskFailed(e.to_string()))?
    }
}

fn execute_blocking(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    debug!(method = req.method.as_str(), path = %req.path, "executing request");

    let result = match req.method {
        HttpMethod::Get => with_headers(agent.get(&req.path), &req.headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&req.path), &req.headers).call(),
        HttpMethod::Post => send(with_headers(agent.post(&req.path), &req.headers), req.body),
        HttpMethod::Put => send(with_headers(agent.put(&req.path), &req.headers), req.body),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    debug!(status, "received response");
    Ok(HttpResponse { status, headers, body })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
