//! Collaborator traits: where ABIs, storage slots and logs come from.
//!
//! The resolver only ever talks to these traits. Concrete implementations
//! live in `chaintail-registry` (ABI registries) and `chaintail-rpc`
//! (node connection). All traits are object-safe so they can be stored as
//! `Arc<dyn ...>`.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use std::sync::Arc;

use crate::abi::AbiDocument;
use crate::error::SourceError;
use crate::event::Log;

/// Fetches the ABI document for a contract address.
///
/// Implementations must bound every call with a timeout.
#[async_trait]
pub trait AbiSource: Send + Sync {
    /// - `Ok(Some(doc))`: the registry knows the contract's interface
    /// - `Ok(None)`: the registry answered but has no verified interface
    /// - `Err(_)`: the registry could not be reached
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError>;
}

/// Reads raw 32-byte storage slots from a node.
#[async_trait]
pub trait StorageReader: Send + Sync {
    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, SourceError>;
}

/// Reads blocks and logs from a node.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> Result<u64, SourceError>;

    /// All logs in the inclusive block range, in block then log order.
    async fn read_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, SourceError>;
}

#[async_trait]
impl<T: AbiSource + ?Sized> AbiSource for Arc<T> {
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError> {
        (**self).fetch_abi(address).await
    }
}

#[async_trait]
impl<T: StorageReader + ?Sized> StorageReader for Arc<T> {
    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, SourceError> {
        (**self).read_storage(address, slot).await
    }
}

#[async_trait]
impl<T: LogSource + ?Sized> LogSource for Arc<T> {
    async fn block_number(&self) -> Result<u64, SourceError> {
        (**self).block_number().await
    }

    async fn read_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, SourceError> {
        (**self).read_logs(from_block, to_block).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(B256);

    #[async_trait]
    impl StorageReader for Fixed {
        async fn read_storage(&self, _address: Address, _slot: B256) -> Result<B256, SourceError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn arc_dyn_forwards() {
        let reader: Arc<dyn StorageReader> = Arc::new(Fixed(B256::repeat_byte(7)));
        let value = reader
            .read_storage(Address::ZERO, B256::ZERO)
            .await
            .unwrap();
        assert_eq!(value, B256::repeat_byte(7));
    }
}
