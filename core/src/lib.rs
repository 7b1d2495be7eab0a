//! Client-side data access for REST backends.
//!
//! # Overview
//! Two independent pieces:
//! - `RestService` / `RestItem`: CRUD over a REST collection with id-based
//!   identity. An item without an id is created with POST, an item with an id
//!   is updated with PUT, and deleting clears the id.
//! - `RemoteData` / `Synchronizer`: a cached value refreshed by an async
//!   fetch, republished to subscribers, and optionally polled on a timer.
//!
//! # Design
//! - `ResourceClient` is stateless: it builds `HttpRequest` values and parses
//!   `HttpResponse` values. A `Transport` performs the round-trip, so items
//!   and services can be tested against `mock::MockTransport`.
//! - Each item owns its client and transport handle; nothing is shared
//!   through global state.
//! - Overlapping `save` or `update` calls are not ordered. The last one to
//!   complete wins.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod item;
pub mod mock;
pub mod remote;
pub mod service;
pub mod synchronizer;
pub mod transport;
pub mod types;

pub use client::ResourceClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use item::{Record, RestItem};
pub use remote::{RemoteData, UpdateHandle};
pub use service::RestService;
pub use synchronizer::Synchronizer;
pub use transport::{Transport, UreqTransport};
pub use types::{Payload, ResourceId};
