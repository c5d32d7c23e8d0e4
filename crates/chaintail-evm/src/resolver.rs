//! `EventResolver`: turns a raw log into a `ResolvedEvent`.
//!
//! Resolution order:
//! 1. the emitting address's own ABI
//! 2. the ABI of the address in its EIP-1967 implementation slot
//! 3. an `Anonymous/Unknown` placeholder
//!
//! Unresolvable logs are a normal outcome and never an error. Only a byte
//! layout that contradicts a matched template is reported, as
//! `ResolveError`, so the caller can decide to skip or abort.

use alloy_primitives::Address;
use chaintail_core::{
    error::ResolveError,
    event::{EventTemplate, Log, ResolvedEvent},
    source::{AbiSource, StorageReader},
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    cache::{AbiCache, CachedAbi},
    decoder,
    index::AbiIndex,
    proxy::ProxyResolver,
};

/// Resolves logs against contract ABIs. Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct EventResolver {
    abi_source: Arc<dyn AbiSource>,
    cache: AbiCache,
    proxy: ProxyResolver,
}

impl EventResolver {
    pub fn new(abi_source: Arc<dyn AbiSource>, storage: Arc<dyn StorageReader>) -> Self {
        Self {
            abi_source,
            cache: AbiCache::new(),
            proxy: ProxyResolver::new(storage),
        }
    }

    /// Use an existing (possibly pre-populated or shared) cache.
    pub fn with_cache(mut self, cache: AbiCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &AbiCache {
        &self.cache
    }

    pub fn proxy(&self) -> &ProxyResolver {
        &self.proxy
    }

    /// The selector index for `address`, fetching its ABI on first use.
    ///
    /// A registry that has no interface for the address is remembered; a
    /// registry that cannot be reached is not, and yields an empty index.
    pub async fn index_for(&self, address: Address) -> Arc<AbiIndex> {
        if let Some(entry) = self.cache.get(&address) {
            debug!(%address, verified = entry.is_verified(), "ABI cache hit");
            return entry.index();
        }

        let entry = match self.abi_source.fetch_abi(address).await {
            Ok(Some(document)) => CachedAbi::verified(document),
            Ok(None) => {
                debug!(%address, "no verified ABI");
                CachedAbi::unverified()
            }
            Err(e) => {
                warn!(%address, error = %e, "ABI fetch failed; treating as unknown");
                return Arc::new(AbiIndex::empty());
            }
        };
        self.cache.insert(address, entry).index()
    }

    /// Resolve a single log.
    pub async fn resolve(&self, log: &Log) -> Result<ResolvedEvent, ResolveError> {
        let address = log.address;
        let Some(selector) = log.selector() else {
            return Ok(ResolvedEvent::unknown(log));
        };

        let (template, proxied_to) = match self.find_template(address, &selector).await {
            Some(found) => found,
            None => {
                debug!(%address, %selector, "unresolved event");
                return Ok(ResolvedEvent::unknown(log));
            }
        };

        let arguments = decoder::decode_arguments(&template, log)
            .map_err(|e| ResolveError::from_decode(address, selector, e))?;

        Ok(ResolvedEvent::from_template(&template, arguments, log, proxied_to))
    }

    /// Resolve many logs with up to `concurrency` in flight. Results keep
    /// the order of `logs`.
    pub async fn resolve_all(
        &self,
        logs: &[Log],
        concurrency: usize,
    ) -> Vec<Result<ResolvedEvent, ResolveError>> {
        futures::stream::iter(logs)
            .map(|log| self.resolve(log))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn find_template(
        &self,
        address: Address,
        selector: &alloy_primitives::B256,
    ) -> Option<(EventTemplate, Option<Address>)> {
        if let Some(template) = self.index_for(address).await.get(selector) {
            return Some((template.clone(), None));
        }

        let proxied = self.proxy.resolve_proxy_target(address).await;
        if proxied == address {
            return None;
        }
        self.index_for(proxied)
            .await
            .get(selector)
            .map(|template| (template.clone(), Some(proxied)))
    }
}

impl std::fmt::Debug for EventResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventResolver")
            .field("cached_abis", &self.cache.len())
            .field("proxy", &self.proxy)
            .finish()
    }
}
