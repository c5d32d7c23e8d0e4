//! # chaintail-evm
//!
//! Resolves raw EVM logs into named, typed events.
//!
//! ## Implementation notes
//! - Topics[0] → event selector (keccak256 of the canonical signature)
//! - Topics[1..] → indexed arguments (each 32 bytes, ABI-encoded)
//! - `data` → non-indexed arguments (ABI-encoded tuple)
//! - Selector not in the emitter's ABI → retry against the EIP-1967
//!   implementation address stored in the emitter's storage
//! - Uses `alloy-core` for the ABI decode itself

pub mod cache;
pub mod decoder;
pub mod index;
pub mod normalizer;
pub mod proxy;
pub mod resolver;

pub use cache::{AbiCache, CachedAbi};
pub use index::{build_index, AbiIndex};
pub use proxy::{ProxyResolver, EIP1967_IMPLEMENTATION_SLOT};
pub use resolver::EventResolver;
