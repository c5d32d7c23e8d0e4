//! Process-wide ABI cache.
//!
//! Maps address → ABI document (with its built index), or to an explicit
//! "unverified" marker when the registry answered that it has no interface
//! for the address. Populated lazily, never evicted. Thread-safe via
//! `Arc<RwLock<..>>`; cloning shares the same store.

use alloy_primitives::Address;
use chaintail_core::abi::AbiDocument;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::index::{build_index, AbiIndex};

/// One cached lookup result. Immutable once built.
#[derive(Debug, Clone)]
pub struct CachedAbi {
    document: Option<Arc<AbiDocument>>,
    index: Arc<AbiIndex>,
}

impl CachedAbi {
    /// A known ABI; its index is built once here.
    pub fn verified(document: AbiDocument) -> Self {
        let index = build_index(&document);
        Self {
            document: Some(Arc::new(document)),
            index: Arc::new(index),
        }
    }

    /// The registry has no interface for this address.
    pub fn unverified() -> Self {
        Self {
            document: None,
            index: Arc::new(AbiIndex::empty()),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.document.is_some()
    }

    pub fn index(&self) -> Arc<AbiIndex> {
        Arc::clone(&self.index)
    }
}

/// Shared address → ABI cache.
#[derive(Debug, Clone)]
pub struct AbiCache {
    inner: Arc<RwLock<HashMap<Address, CachedAbi>>>,
}

impl AbiCache {
    /// New cache with the zero address seeded to an empty ABI: failed proxy
    /// lookups resolve there and must not trigger remote fetches.
    pub fn new() -> Self {
        let mut map = HashMap::new();
        map.insert(Address::ZERO, CachedAbi::verified(AbiDocument::empty()));
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn get(&self, address: &Address) -> Option<CachedAbi> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    /// Insert if absent and return whichever entry ends up cached.
    ///
    /// Concurrent first fetches for the same address race harmlessly: the
    /// first writer's entry is kept and returned to every later writer.
    pub fn insert(&self, address: Address, entry: CachedAbi) -> CachedAbi {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(address)
            .or_insert(entry)
            .clone()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address)
    }

    /// Number of cached addresses, the zero-address seed included.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AbiCache {
    fn default() -> Self {
        Self::new()
    }
}
