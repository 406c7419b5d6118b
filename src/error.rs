//! Error types.
//!
//! Nothing in this crate recovers from an error locally: a failed connection,
//! a rejected command or a malformed record all abort the run that hit them.

use thiserror::Error;

/// Failures reported by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to '{address}': {reason}")]
    Connect { address: String, reason: String },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("operation dropped before it completed")]
    Cancelled,

    #[error("command rejected: {0}")]
    Rejected(String),
}

/// A record that cannot be built or put on the wire.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("keyValue[{index}] holds non-finite value {value}")]
    NonFinite { index: usize, value: f64 },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid runner arguments.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown access pattern '{0}' (expected batched, sequential or publish)")]
    UnknownPattern(String),
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("signal: {0}")]
    Signal(#[from] SignalError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;
