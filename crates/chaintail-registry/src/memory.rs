//! In-memory `AbiSource` implementation.
//!
//! Suitable for testing, offline runs, and pinning ABIs that the remote
//! registry does not have. Thread-safe via `Arc<RwLock<..>>`.

use alloy_primitives::Address;
use async_trait::async_trait;
use chaintail_core::{abi::AbiDocument, error::SourceError, source::AbiSource};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

use crate::error::RegistryError;

/// Fixed address → ABI map. Addresses without an entry have no verified ABI.
#[derive(Debug, Clone, Default)]
pub struct StaticAbiSource {
    abis: Arc<RwLock<HashMap<Address, AbiDocument>>>,
}

impl StaticAbiSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, address: Address, abi: AbiDocument) -> Self {
        self.insert(address, abi);
        self
    }

    /// Insert or replace the ABI for `address`.
    pub fn insert(&self, address: Address, abi: AbiDocument) {
        self.abis
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, abi);
    }

    pub fn get(&self, address: &Address) -> Option<AbiDocument> {
        self.abis
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    /// Load every `<address>.json` file found under `dir`, recursively.
    ///
    /// Each file holds an ABI array or a compiler artifact with an `abi` key.
    /// Files with other extensions are ignored. Returns the number loaded.
    pub fn load_directory(&self, dir: &Path) -> Result<usize, RegistryError> {
        let mut count = 0;
        for path in walkdir_json(dir)? {
            self.load_file(&path)?;
            count += 1;
        }
        debug!(dir = %dir.display(), count, "loaded ABI directory");
        Ok(count)
    }

    /// Load a single `<address>.json` file; the address comes from the file stem.
    pub fn load_file(&self, path: &Path) -> Result<Address, RegistryError> {
        let address = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<Address>().ok())
            .ok_or_else(|| RegistryError::InvalidAddress {
                path: path.to_path_buf(),
            })?;

        let content = std::fs::read_to_string(path)?;
        let abi = AbiDocument::from_json(&content).map_err(|e| RegistryError::InvalidAbi {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.insert(address, abi);
        Ok(address)
    }

    pub fn len(&self) -> usize {
        self.abis.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AbiSource for StaticAbiSource {
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError> {
        Ok(self.get(&address))
    }
}

fn walkdir_json(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(walkdir_json(&path)?);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
