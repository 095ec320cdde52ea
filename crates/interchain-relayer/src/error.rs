//! Error types for the relayer.

use std::time::Duration;

use interchain_channel::ChannelError;
use interchain_core::CoreError;
use thiserror::Error;

/// Errors raised while relaying.
///
/// None of these stop the relayer: a failed cycle is logged and the gap is
/// re-derived from chain state on the next one.
#[derive(Debug, Error)]
pub enum RelayerError {
    /// Destination rejected the transaction.
    #[error("submission to {chain} failed with code {code}: {log}")]
    Submission { chain: String, code: u32, log: String },

    /// Query answered with a non-zero code.
    #[error("query {path} on {chain} failed with code {code}: {log}")]
    Query {
        chain: String,
        path: String,
        code: u32,
        log: String,
    },

    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    /// Response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Node unreachable or answered with a protocol error.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl From<CoreError> for RelayerError {
    fn from(e: CoreError) -> Self {
        RelayerError::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for RelayerError {
    fn from(e: reqwest::Error) -> Self {
        RelayerError::Transport(e.to_string())
    }
}

/// Result type for relayer operations.
pub type Result<T> = std::result::Result<T, RelayerError>;
