//! Ordered fallback across several ABI sources.

use alloy_primitives::Address;
use async_trait::async_trait;
use chaintail_core::{abi::AbiDocument, error::SourceError, source::AbiSource};
use std::sync::Arc;

/// Asks each source in turn; the first verified ABI wins.
///
/// A source that fails is skipped. If no source has the ABI and at least one
/// failed, the last failure is returned so the answer is not cached as
/// unverified.
#[derive(Clone, Default)]
pub struct LayeredAbiSource {
    sources: Vec<Arc<dyn AbiSource>>,
}

impl LayeredAbiSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, source: Arc<dyn AbiSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl AbiSource for LayeredAbiSource {
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError> {
        let mut failure = None;
        for source in &self.sources {
            match source.fetch_abi(address).await {
                Ok(Some(abi)) => return Ok(Some(abi)),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(%address, error = %e, "ABI source failed; trying next");
                    failure = Some(e);
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for LayeredAbiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredAbiSource")
            .field("sources", &self.sources.len())
            .finish()
    }
}
