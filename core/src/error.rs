//! Error types for the demo API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant so callers can branch on "the resource
//! does not exist" without inspecting status codes. Any status an operation
//! does not list lands in `UnexpectedResponse` with the raw status and body.
//! Transport failures are wrapped as-is in `Transport`; the client never
//! reclassifies or retries them.

use thiserror::Error;

/// Failures raised by a [`Transport`](crate::transport::Transport) while
/// performing network I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport timed out: {0}")]
    Timeout(String),

    #[error("failed to read response body: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors returned by [`ApiClient`](crate::ApiClient) and the operation
/// parsers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An environment URL is unregistered or malformed, or a configuration
    /// value could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server reported that the requested resource does not exist.
    #[error("{operation}: resource not found")]
    NotFound { operation: &'static str },

    /// The server returned a status the operation does not list.
    #[error("{operation}: unexpected response HTTP {status}: {body}")]
    UnexpectedResponse {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The per-call timeout elapsed before a response arrived.
    #[error("{operation}: no response within {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },

    /// A success response body could not be decoded into the expected type.
    #[error("{operation}: failed to decode response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// The request payload could not be encoded as JSON.
    #[error("failed to encode request: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::UnexpectedResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}
