//! Remote ABI fetching from Etherscan-compatible block explorers.
//!
//! Uses the `module=contract&action=getabi` endpoint. Etherscan wraps every
//! answer in `{ status, message, result }`; on success `result` is the ABI
//! itself, serialized as a JSON string.
//!
//! # Feature Flag
//! This module requires the `remote` feature flag (enables `reqwest`).
//!
//! ```toml
//! chaintail-registry = { version = "0.1", features = ["remote"] }
//! ```

use alloy_primitives::Address;
use async_trait::async_trait;
use chaintail_core::{abi::AbiDocument, error::SourceError, source::AbiSource};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Etherscan mainnet API.
pub const DEFAULT_ETHERSCAN_BASE: &str = "https://api.etherscan.io/api";

/// Request timeout used by [`EtherscanAbiSource::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Error ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by {explorer}")]
    RateLimited { explorer: String },

    #[error("Invalid response from {explorer}: {reason}")]
    InvalidResponse { explorer: String, reason: String },

    #[error("Invalid ABI JSON returned from {explorer}: {reason}")]
    InvalidAbi { explorer: String, reason: String },

    /// The explorer refused the request itself (bad key, retired endpoint).
    #[error("{explorer} rejected the request: {reason}")]
    Rejected { explorer: String, reason: String },
}

impl From<RemoteError> for SourceError {
    fn from(e: RemoteError) -> Self {
        match &e {
            RemoteError::Http(_)
            | RemoteError::RateLimited { .. }
            | RemoteError::Rejected { .. } => {
                SourceError::unavailable(e.to_string())
            }
            RemoteError::InvalidResponse { .. } | RemoteError::InvalidAbi { .. } => {
                SourceError::invalid(e.to_string())
            }
        }
    }
}

// ─── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

/// Interpret a raw `getabi` response body.
///
/// `status == "1"` yields the parsed ABI. The explicit "source code not
/// verified" answer is `Ok(None)`. Every other non-success answer (rate
/// limits, key problems, endpoint notices) is an error, so it is never
/// remembered as a missing ABI.
pub fn parse_getabi_response(body: &str) -> Result<Option<AbiDocument>, RemoteError> {
    let body: EtherscanResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse {
            explorer: "Etherscan".into(),
            reason: e.to_string(),
        })?;

    let result = body.result.as_str().unwrap_or_default();
    if body.status != "1" {
        let lowered = result.to_ascii_lowercase();
        if lowered.contains("source code not verified") {
            debug!(message = %body.message, result, "explorer has no verified ABI");
            return Ok(None);
        }
        if lowered.contains("rate limit") {
            return Err(RemoteError::RateLimited {
                explorer: "Etherscan".into(),
            });
        }
        let reason = if result.is_empty() {
            body.message
        } else {
            result.to_string()
        };
        return Err(RemoteError::Rejected {
            explorer: "Etherscan".into(),
            reason,
        });
    }

    AbiDocument::from_json(result)
        .map(Some)
        .map_err(|e| RemoteError::InvalidAbi {
            explorer: "Etherscan".into(),
            reason: e.to_string(),
        })
}

// ─── Source ───────────────────────────────────────────────────────────────

/// `AbiSource` backed by an Etherscan-compatible explorer.
#[derive(Debug, Clone)]
pub struct EtherscanAbiSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherscanAbiSource {
    /// Mainnet Etherscan with the default 5 s timeout.
    pub fn new() -> Result<Self, RemoteError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chaintail/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_ETHERSCAN_BASE.into(),
            api_key: None,
        })
    }

    /// Set the Etherscan API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom Etherscan-compatible API base URL.
    ///
    /// Use this for chain-specific Etherscan forks:
    /// - Arbiscan: `https://api.arbiscan.io/api`
    /// - Polygonscan: `https://api.polygonscan.com/api`
    /// - Basescan: `https://api.basescan.org/api`
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the verified ABI of `address`, if the explorer has one.
    pub async fn fetch(&self, address: Address) -> Result<Option<AbiDocument>, RemoteError> {
        let address = address.to_string();
        let mut query = vec![
            ("module", "contract"),
            ("action", "getabi"),
            ("address", address.as_str()),
        ];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("apikey", key));
        }

        let resp = self.client.get(&self.base_url).query(&query).send().await?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited {
                explorer: "Etherscan".into(),
            });
        }

        let body = resp.error_for_status()?.text().await?;
        parse_getabi_response(&body)
    }
}

#[async_trait]
impl AbiSource for EtherscanAbiSource {
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError> {
        Ok(self.fetch(address).await?)
    }
}
