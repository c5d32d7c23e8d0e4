use std::path::PathBuf;
use thiserror::Error;

/// Errors loading ABI files into a `StaticAbiSource`.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("file name {path} is not a contract address")]
    InvalidAddress { path: PathBuf },

    #[error("invalid ABI JSON in {path}: {reason}")]
    InvalidAbi { path: PathBuf, reason: String },
}
