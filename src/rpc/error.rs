//! RPC error types.

use std::io;
use thiserror::Error;

use crate::report::row::RowError;

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur talking to the report server.
#[derive(Error, Debug)]
pub enum RpcError {
    /// HTTP request could not be sent or its body not read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to spawn the responder process.
    #[error("failed to spawn bridge process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Failed to write to the responder's stdin.
    #[error("failed to write to bridge: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to read from the responder's stdout.
    #[error("failed to read from bridge: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("failed to deserialize response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// Result rows did not decode.
    #[error("malformed result rows: {0}")]
    Rows(#[from] RowError),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The transport went away before answering.
    #[error("transport closed before a response arrived")]
    TransportClosed,

    /// The server reported `success: false`.
    #[error("server error: {message}")]
    Remote { message: String },

    /// The response did not have the envelope shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transport settings are unusable.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl RpcError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// The single message shown to the user for any failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message } => message.clone(),
            Self::Timeout(_) | Self::TransportClosed | Self::Http(_) | Self::Status { .. } => {
                "The report server could not be reached".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::TransportClosed => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for RpcError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::TransportClosed
    }
}
