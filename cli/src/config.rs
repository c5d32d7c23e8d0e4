//! Tailer configuration.
//!
//! Loaded from an optional JSON file, then overridden field by field by
//! command-line flags and their environment fallbacks.

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use chaintail_observability::LogConfig;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Everything `chaintail tail` needs to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailConfig {
    /// HTTP JSON-RPC endpoint of the node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etherscan_api_key: Option<String>,
    /// Etherscan-compatible API base URL
    #[serde(default = "default_etherscan_base")]
    pub etherscan_base: String,
    /// Directory of `<address>.json` ABIs consulted before Etherscan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_dir: Option<PathBuf>,
    /// Only tail these contracts (empty = every log in each block)
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Start here instead of at the current head
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_abi_timeout_ms")]
    pub abi_timeout_ms: u64,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Widest block span per `eth_getLogs` call
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
    /// Logs resolved concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// One JSON object per event instead of text lines
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_rpc_url() -> String { "http://localhost:8545".into() }
fn default_etherscan_base() -> String { "https://api.etherscan.io/api".into() }
fn default_poll_interval_ms() -> u64 { 1_000 }
fn default_abi_timeout_ms() -> u64 { 5_000 }
fn default_rpc_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> u32 { 3 }
fn default_max_block_range() -> u64 { 2_000 }
fn default_concurrency() -> usize { 8 }

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            etherscan_api_key: None,
            etherscan_base: default_etherscan_base(),
            abi_dir: None,
            addresses: Vec::new(),
            from_block: None,
            poll_interval_ms: default_poll_interval_ms(),
            abi_timeout_ms: default_abi_timeout_ms(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            max_retries: default_max_retries(),
            max_block_range: default_max_block_range(),
            concurrency: default_concurrency(),
            json: false,
            log: LogConfig::default(),
        }
    }
}

impl TailConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.rpc_url)
            .with_context(|| format!("invalid RPC URL '{}'", self.rpc_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("RPC URL must be http(s), got '{}'", url.scheme());
        }
        url::Url::parse(&self.etherscan_base)
            .with_context(|| format!("invalid Etherscan URL '{}'", self.etherscan_base))?;
        if self.poll_interval_ms == 0 {
            bail!("poll interval must be positive");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.max_block_range == 0 {
            bail!("max block range must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn abi_timeout(&self) -> Duration {
        Duration::from_millis(self.abi_timeout_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
