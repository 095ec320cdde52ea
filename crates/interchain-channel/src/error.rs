//! Error types for the channel module.

use interchain_core::{CoreError, DatagramKind, PayloadError};
use interchain_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the keeper's handler and query surfaces.
///
/// Every variant maps to a stable numeric [`code`](ChannelError::code) so
/// that submitters and query clients can react without parsing messages.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Claimed index differs from the current ingress counter.
    #[error("sequence mismatch on {kind} channel from {chain}: expected {expected}, got {got}")]
    SequenceMismatch {
        kind: DatagramKind,
        chain: String,
        expected: u64,
        got: u64,
    },

    /// Malformed message or query parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Egress index at or past the end of the queue.
    #[error("datagram {index} not found: egress length is {length}")]
    NotFound { index: u64, length: u64 },

    /// Registered payload handler reported an error.
    #[error("payload handler for {type_tag} failed: {reason}")]
    PayloadHandlerFailure { type_tag: String, reason: String },

    /// No handler registered for the payload type.
    #[error("no handler registered for payload type {0}")]
    UnknownPayload(String),

    /// Query path not served by this module.
    #[error("unknown request: {0}")]
    UnknownRequest(String),

    /// Transaction signature or signer check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),
}

impl ChannelError {
    /// Stable numeric code. Zero is reserved for success.
    pub fn code(&self) -> u32 {
        match self {
            ChannelError::InvalidArgument(_) => 2,
            ChannelError::NotFound { .. } => 3,
            ChannelError::SequenceMismatch { .. } => 4,
            ChannelError::PayloadHandlerFailure { .. } => 5,
            ChannelError::UnknownPayload(_) => 6,
            ChannelError::UnknownRequest(_) => 7,
            ChannelError::Unauthorized(_) => 8,
            ChannelError::Store(_) => 9,
            ChannelError::Codec(_) => 10,
        }
    }
}

impl From<PayloadError> for ChannelError {
    fn from(e: PayloadError) -> Self {
        ChannelError::InvalidArgument(e.to_string())
    }
}

/// Error reported by a payload handler.
///
/// Handler errors are terminal for the datagram being processed: the
/// ingress counter still advances and a failure receipt is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> Self {
        Self(e.to_string())
    }
}

impl From<CoreError> for HandlerError {
    fn from(e: CoreError) -> Self {
        Self(e.to_string())
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
