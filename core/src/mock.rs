//! In-memory `Transport` for tests.
//!
//! `MockTransport` replays scripted responses in FIFO order and records every
//! request it receives, so tests can assert on the exact verbs and URLs an
//! item or service produced without a server.
//!
//! ```rust
//! use std::sync::Arc;
//! use restsync_core::mock::MockTransport;
//! use restsync_core::{HttpMethod, Payload, ResourceClient, RestService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = Arc::new(MockTransport::new());
//! transport.push_json(201, serde_json::json!({"id": 7}));
//!
//! let client = ResourceClient::new("http://api", "notes");
//! let service = RestService::new(client, transport.clone(), Payload::new);
//! let mut note = service.create_new();
//! note.save().await.unwrap();
//!
//! assert_eq!(note.id().unwrap().as_str(), "7");
//! assert_eq!(transport.requests()[0].method, HttpMethod::Post);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Default)]
struct State {
    responses: VecDeque<Result<HttpResponse, ApiError>>,
    requests: Vec<HttpRequest>,
}

/// Scripted transport. Returns `ApiError::Transport` once the script runs out.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.state().responses.push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(status, &body.to_string());
    }

    /// Script a network-level failure.
    pub fn push_error(&self, message: &str) {
        self.state()
            .responses
            .push_back(Err(ApiError::Transport(message.to_string())));
    }

    /// Every request executed so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state().responses.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut state = self.state();
        state.requests.push(request);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response left".to_string())))
    }
}
