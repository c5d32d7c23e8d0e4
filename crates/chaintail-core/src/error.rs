//! Error types for the ChainTail resolve pipeline.

use alloy_primitives::{Address, B256};
use thiserror::Error;

/// Errors raised while decoding argument bytes against their ABI types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Unsupported ABI type: {tag}")]
    UnsupportedType { tag: String },
}

impl DecodeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn unsupported(tag: impl Into<String>) -> Self {
        Self::UnsupportedType { tag: tag.into() }
    }
}

/// Errors from the external collaborators (ABI registry, node connection).
///
/// The resolver never propagates these: a failed ABI fetch degrades to an
/// empty ABI and a failed storage read to the zero address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// A decode failure tagged with the log it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Malformed payload in log from {address} (selector {selector}): {reason}")]
    MalformedPayload {
        address: Address,
        selector: B256,
        reason: String,
    },

    #[error("Unsupported ABI type {tag} in log from {address} (selector {selector})")]
    UnsupportedType {
        address: Address,
        selector: B256,
        tag: String,
    },
}

impl ResolveError {
    /// Attach the offending log's address and selector to a decode error.
    pub fn from_decode(address: Address, selector: B256, err: DecodeError) -> Self {
        match err {
            DecodeError::MalformedPayload { reason } => Self::MalformedPayload {
                address,
                selector,
                reason,
            },
            DecodeError::UnsupportedType { tag } => Self::UnsupportedType {
                address,
                selector,
                tag,
            },
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Self::MalformedPayload { address, .. } | Self::UnsupportedType { address, .. } => {
                *address
            }
        }
    }

    pub fn selector(&self) -> B256 {
        match self {
            Self::MalformedPayload { selector, .. } | Self::UnsupportedType { selector, .. } => {
                *selector
            }
        }
    }
}
