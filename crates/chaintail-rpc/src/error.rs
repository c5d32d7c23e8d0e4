//! Transport-level error types.

use chaintail_core::error::SourceError;
use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            // -32005: limit exceeded / rate limited (EIP-1474)
            Self::Rpc(e) => e.code == -32005,
            Self::Deserialization(_) | Self::Config(_) => false,
        }
    }
}

impl From<TransportError> for SourceError {
    fn from(e: TransportError) -> Self {
        match &e {
            TransportError::Http(_) | TransportError::Timeout { .. } | TransportError::Config(_) => {
                SourceError::unavailable(e.to_string())
            }
            TransportError::Rpc(_) | TransportError::Deserialization(_) => {
                SourceError::invalid(e.to_string())
            }
        }
    }
}
