//! # chaintail-registry
//!
//! Implementations of `chaintail_core::AbiSource`.
//!
//! ## Sources
//! 1. **Static**: fixed address → ABI map, optionally loaded from a directory
//!    of `<address>.json` files. Used offline and in tests.
//! 2. **Etherscan** (feature `remote`): the `getabi` endpoint of Etherscan or
//!    any compatible explorer.
//! 3. **Layered**: tries several sources in order, e.g. local overrides
//!    before Etherscan.

pub mod error;
#[cfg(feature = "remote")]
pub mod etherscan;
pub mod layered;
pub mod memory;

pub use error::RegistryError;
pub use layered::LayeredAbiSource;
pub use memory::StaticAbiSource;

#[cfg(feature = "remote")]
pub use etherscan::{EtherscanAbiSource, RemoteError};
