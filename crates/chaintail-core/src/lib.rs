//! # chaintail-core
//!
//! Core types, traits, and primitives shared across all ChainTail crates.
//! The resolver, the remote ABI registry and the JSON-RPC client are all
//! built on top of the interfaces defined here.

pub mod abi;
pub mod error;
pub mod event;
pub mod signature;
pub mod source;
pub mod types;

pub use abi::{AbiDocument, AbiEntry, AbiParam};
pub use error::{DecodeError, ResolveError, SourceError};
pub use event::{EventArgument, EventTemplate, Log, ResolvedEvent, UNKNOWN_EVENT_NAME};
pub use signature::digest;
pub use source::{AbiSource, LogSource, StorageReader};
pub use types::{AbiType, AbiValue};
