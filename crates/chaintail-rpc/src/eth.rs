//! The `eth_*` calls ChainTail makes against a node.

use alloy_primitives::{Address, B256, U64};
use async_trait::async_trait;
use chaintail_core::{
    error::SourceError,
    event::Log,
    source::{LogSource, StorageReader},
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::TransportError;
use crate::log::RpcLog;
use crate::transport::{call, RpcTransport};

/// Default widest block span requested in a single `eth_getLogs` call.
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 2_000;

/// Ethereum node access over any [`RpcTransport`].
#[derive(Debug)]
pub struct EthClient<T> {
    transport: T,
    next_id: AtomicU64,
    max_block_range: u64,
    addresses: Vec<Address>,
}

impl<T: RpcTransport> EthClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
            addresses: Vec::new(),
        }
    }

    /// Split `eth_getLogs` requests into spans of at most `blocks` blocks.
    pub fn with_max_block_range(mut self, blocks: u64) -> Self {
        self.max_block_range = blocks.max(1);
        self
    }

    /// Only return logs emitted by these contracts. Empty means all.
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        call(&self.transport, id, method, params).await
    }

    /// `eth_blockNumber`
    pub async fn head_block_number(&self) -> Result<u64, TransportError> {
        let n: U64 = self.call("eth_blockNumber", vec![]).await?;
        Ok(n.to::<u64>())
    }

    /// `eth_getStorageAt` at the latest block.
    pub async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, TransportError> {
        self.call("eth_getStorageAt", vec![json!(address), json!(slot), json!("latest")])
            .await
    }

    /// `eth_getLogs` over `[from, to]`, split into spans of at most
    /// `max_block_range` blocks. Logs marked `removed` are dropped.
    pub async fn logs(&self, from: u64, to: u64) -> Result<Vec<RpcLog>, TransportError> {
        let mut all = Vec::new();
        let mut start = from;
        while start <= to {
            let end = start.saturating_add(self.max_block_range - 1).min(to);
            let chunk: Vec<RpcLog> = self
                .call("eth_getLogs", vec![self.filter(start, end)])
                .await?;
            debug!(from = start, to = end, count = chunk.len(), "fetched logs");
            all.extend(chunk.into_iter().filter(|l| !l.is_removed()));
            if end == u64::MAX {
                break;
            }
            start = end + 1;
        }
        Ok(all)
    }

    fn filter(&self, from: u64, to: u64) -> Value {
        let mut filter = json!({
            "fromBlock": U64::from(from),
            "toBlock": U64::from(to),
        });
        match self.addresses.as_slice() {
            [] => {}
            [one] => filter["address"] = json!(one),
            many => filter["address"] = json!(many),
        }
        filter
    }
}

#[async_trait]
impl<T: RpcTransport> StorageReader for EthClient<T> {
    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, SourceError> {
        Ok(self.storage_at(address, slot).await?)
    }
}

#[async_trait]
impl<T: RpcTransport> LogSource for EthClient<T> {
    async fn block_number(&self) -> Result<u64, SourceError> {
        Ok(self.head_block_number().await?)
    }

    async fn read_logs(&self, from: u64, to: u64) -> Result<Vec<Log>, SourceError> {
        Ok(self.logs(from, to).await?.into_iter().map(Log::from).collect())
    }
}
