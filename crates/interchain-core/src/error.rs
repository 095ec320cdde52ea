//! Error types for interchain core.

use thiserror::Error;

/// Core errors raised by encoding, decoding and boundary checks.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid datagram kind: {0}")]
    InvalidKind(u8),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors reported by a payload's own `validate_basic`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("empty payload type tag")]
    EmptyTypeTag,

    #[error("payload has no signers")]
    NoSigners,

    #[error("payload kind mismatch: expected {expected}, got {got}")]
    KindMismatch { expected: String, got: String },

    #[error("invalid payload: {0}")]
    Invalid(String),
}
