//! Error types for the document store client.
//!
//! # Design
//! Local validation failures (`ConfigRequired`, `Validation`, `InvalidJson`)
//! are raised before any request is built. `Http` carries the message the
//! server put in its `error` field, or `HTTP <status>` when it sent none, and
//! displays exactly that text so it can be shown to the user unchanged.

use thiserror::Error;

/// Errors produced while building requests or interpreting responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API URL or API key is empty.
    #[error("Please configure API URL and API Key first")]
    ConfigRequired,

    /// A required form field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A free-form JSON field did not parse.
    #[error("Invalid JSON in {field}: {reason}")]
    InvalidJson { field: String, reason: String },

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
