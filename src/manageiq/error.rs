//! Error types
//!
//! Every failure is terminal for the invocation: nothing here is retried,
//! the dispatcher turns it into a failed outcome carrying `to_string()`.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single invocation.
#[derive(Debug, Error)]
pub enum VmdbError {
    /// Missing or contradictory connection parameters, detected before any
    /// network call.
    #[error("{0}")]
    InvalidConnection(String),

    /// The resource/action arguments do not form a valid request.
    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The requested action is not in the resource's action list.
    #[error("Action not found")]
    ActionNotFound { action: String },

    /// The API answered the action with `success: false`.
    #[error("{0}")]
    ActionRejected(String),
}

/// Failures talking to the API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to send request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed: {status} - {message}")]
    Status { status: StatusCode, message: String },

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl VmdbError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Transport(TransportError::Malformed(msg.into()))
    }
}
