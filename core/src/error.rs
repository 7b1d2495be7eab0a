//! Error types for the resource client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging.
//!
//! `IdAlreadySet` and `NotPersisted` are caller contract violations. They are
//! reported before any request is sent.

/// Errors returned by the client, items, services and remote data.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A backend record came back without an id.
    #[error("id is not defined in a record received from {resource}")]
    MissingId { resource: String },

    /// An id field held something other than a string or an integer.
    #[error("invalid id value: {0}")]
    InvalidId(String),

    /// Attempted to assign an id to an item that already has one.
    #[error("cannot set the id for an item with id {id}")]
    IdAlreadySet { id: String },

    /// Attempted to delete an item that was never saved.
    #[error("item has no id, nothing to delete")]
    NotPersisted,

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A background update task panicked or was cancelled.
    #[error("update task failed: {0}")]
    TaskFailed(String),

    /// A synchronizer was configured with a zero interval.
    #[error("polling interval must be greater than zero")]
    InvalidInterval,

    /// Configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),
}
