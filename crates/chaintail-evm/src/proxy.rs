//! EIP-1967 proxy resolution.
//!
//! A transparent proxy keeps the address of its implementation contract in a
//! fixed storage slot. Reading that slot gives the address whose ABI defines
//! the events the proxy emits.
//!
//! The result is a hint, not a guarantee: a contract that is not a proxy
//! yields the zero address (or whatever happens to live in that slot).

use alloy_primitives::{b256, Address, B256};
use chaintail_core::source::StorageReader;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// EIP-1967 implementation slot:
/// `keccak256("eip1967.proxy.implementation") - 1`
pub const EIP1967_IMPLEMENTATION_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// Interpret a 32-byte storage value as an address (its low-order 20 bytes).
pub fn slot_to_address(slot_value: B256) -> Address {
    Address::from_word(slot_value)
}

/// Looks up proxy implementation addresses, caching each answer per proxy.
#[derive(Clone)]
pub struct ProxyResolver {
    storage: Arc<dyn StorageReader>,
    targets: Arc<RwLock<HashMap<Address, Address>>>,
}

impl ProxyResolver {
    pub fn new(storage: Arc<dyn StorageReader>) -> Self {
        Self {
            storage,
            targets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The implementation address recorded in `address`'s EIP-1967 slot.
    ///
    /// A failed storage read logs a warning and yields the zero address; the
    /// failure is not cached so the next lookup retries.
    pub async fn resolve_proxy_target(&self, address: Address) -> Address {
        if let Some(target) = self.cached(&address) {
            debug!(%address, %target, "proxy target cache hit");
            return target;
        }

        match self
            .storage
            .read_storage(address, EIP1967_IMPLEMENTATION_SLOT)
            .await
        {
            Ok(raw) => {
                let target = slot_to_address(raw);
                self.targets
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(address)
                    .or_insert(target);
                target
            }
            Err(e) => {
                warn!(%address, error = %e, "proxy slot read failed; treating as non-proxy");
                Address::ZERO
            }
        }
    }

    /// A previously resolved target, if any.
    pub fn cached(&self, address: &Address) -> Option<Address> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
    }
}

impl std::fmt::Debug for ProxyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResolver")
            .field("cached_targets", &self.targets.read().map(|t| t.len()).unwrap_or(0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use async_trait::async_trait;
    use chaintail_core::error::SourceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStorage {
        value: Option<B256>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl StorageReader for CountingStorage {
        async fn read_storage(&self, _address: Address, slot: B256) -> Result<B256, SourceError> {
            assert_eq!(slot, EIP1967_IMPLEMENTATION_SLOT);
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.value.ok_or_else(|| SourceError::unavailable("node down"))
        }
    }

    #[test]
    fn slot_value_keeps_low_20_bytes() {
        let raw = b256!("000000000000000000000000fe7de3c1e1bd252c67667b56347cabfc6df08df4");
        assert_eq!(
            slot_to_address(raw),
            address!("fe7de3c1e1bd252c67667b56347cabfc6df08df4")
        );
    }

    #[test]
    fn dirty_high_bytes_are_dropped() {
        let raw = B256::repeat_byte(0xff);
        assert_eq!(slot_to_address(raw), Address::repeat_byte(0xff));
    }

    #[tokio::test]
    async fn resolves_and_caches() {
        let target = Address::repeat_byte(0xbe);
        let storage = Arc::new(CountingStorage {
            value: Some(target.into_word()),
            reads: AtomicUsize::new(0),
        });
        let resolver = ProxyResolver::new(storage.clone());
        let proxy = Address::repeat_byte(0x01);

        assert_eq!(resolver.resolve_proxy_target(proxy).await, target);
        assert_eq!(resolver.resolve_proxy_target(proxy).await, target);
        assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_proxy_yields_zero_and_is_cached() {
        let storage = Arc::new(CountingStorage {
            value: Some(B256::ZERO),
            reads: AtomicUsize::new(0),
        });
        let resolver = ProxyResolver::new(storage.clone());
        let addr = Address::repeat_byte(0x02);
        assert_eq!(resolver.resolve_proxy_target(addr).await, Address::ZERO);
        assert_eq!(resolver.cached(&addr), Some(Address::ZERO));
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_zero_uncached() {
        let storage = Arc::new(CountingStorage {
            value: None,
            reads: AtomicUsize::new(0),
        });
        let resolver = ProxyResolver::new(storage.clone());
        let addr = Address::repeat_byte(0x03);
        assert_eq!(resolver.resolve_proxy_target(addr).await, Address::ZERO);
        assert_eq!(resolver.resolve_proxy_target(addr).await, Address::ZERO);
        assert!(resolver.cached(&addr).is_none());
        assert_eq!(storage.reads.load(Ordering::SeqCst), 2);
    }
}
