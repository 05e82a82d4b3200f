use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::batch::SubRequest;

/// One batch item that failed with a non-retryable platform error.
///
/// Carries the originating sub-request and the parsed error body so callers
/// can report exactly which logical operations were lost.
#[derive(Debug, Clone, Serialize)]
pub struct UnsolvableItem {
    pub request: SubRequest,
    pub response: Value,
}

/// Unified error type for the batch orchestration client.
///
/// Lower-level errors are wrapped with request context (URL, method, elapsed
/// time, response snapshot) as they cross component boundaries; the top-level
/// operations forward them without swallowing.
#[derive(Debug, Error)]
pub enum Error {
    /// A required inbound field is missing. Surfaced before any network work.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The batch endpoint itself answered 4xx. Never retried.
    #[error("Client error during batch request: HTTP {status} {method} {url} after {elapsed_ms}ms")]
    Client {
        status: u16,
        url: String,
        method: String,
        elapsed_ms: u128,
        response: Value,
    },

    /// The retry budget for a single outbound call was exhausted.
    #[error("Request timed out after {elapsed_ms}ms")]
    Timeout {
        url: Option<String>,
        method: Option<String>,
        elapsed_ms: u128,
        response: Option<Value>,
    },

    /// One or more items of a batch failed with a non-retryable error code.
    #[error("{} item(s) in the batch request were not fetched because of an error", .items.len())]
    UnsolvableItems { items: Vec<UnsolvableItem> },

    /// Raw non-2xx response from the batch endpoint, before the retry loop
    /// classifies it as `Client` or `Timeout`.
    #[error("Remote error: HTTP {status} for {method} {url}")]
    Remote {
        status: u16,
        url: String,
        method: String,
        body: String,
    },

    /// Generic runtime error.
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
        }
    }

    /// Create a generic runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime {
            message: msg.into(),
        }
    }

    /// Whether this error was caused by the request itself (HTTP 4xx).
    /// Client errors fail fast: retrying the same call cannot succeed.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Remote { status, .. } => (400..500).contains(status),
            Error::Client { .. } => true,
            Error::Transport(e) => e.status().map(|s| s.is_client_error()).unwrap_or(false),
            _ => false,
        }
    }
}
