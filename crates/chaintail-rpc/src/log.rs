//! `eth_getLogs` result entries.

use alloy_primitives::{Address, Bytes, B256, U64};
use chaintail_core::event::Log;
use serde::{Deserialize, Serialize};

/// A log as returned by `eth_getLogs`. Quantities are hex strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    /// `None` for pending logs
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<U64>,
    /// Set when the log was dropped by a reorg.
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RpcLog {
    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

impl From<RpcLog> for Log {
    fn from(raw: RpcLog) -> Self {
        Log {
            address: raw.address,
            topics: raw.topics,
            data: raw.data,
            block_number: raw.block_number.map(|n| n.to::<u64>()),
            transaction_hash: raw.transaction_hash,
            log_index: raw.log_index.map(|n| n.to::<u64>()),
        }
    }
}
