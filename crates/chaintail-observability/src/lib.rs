//! # chaintail-observability
//!
//! Logging setup for ChainTail binaries.
//!
//! Resolved events go to stdout; diagnostics go to stderr through
//! `tracing`, as human-readable text or as JSON lines compatible with
//! ELK, Loki and CloudWatch. Levels are configurable per component.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
