//! # chaintail-rpc
//!
//! Node access over Ethereum JSON-RPC.
//!
//! - [`RpcTransport`]: the request/response seam; [`HttpRpcClient`] is the
//!   `reqwest` implementation with retry and exponential backoff.
//! - [`EthClient`]: the `eth_*` calls ChainTail needs, implementing
//!   `StorageReader` and `LogSource` on top of any transport.

pub mod client;
pub mod error;
pub mod eth;
pub mod log;
pub mod request;
pub mod retry;
pub mod transport;

pub use client::{HttpClientConfig, HttpRpcClient};
pub use error::TransportError;
pub use eth::EthClient;
pub use log::RpcLog;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::RpcTransport;
