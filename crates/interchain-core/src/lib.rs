//! # Interchain Core
//!
//! Pure primitives for interchain channels: datagrams, payloads, the
//! byte-level key layout of channel queues, and the binary codec.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`DatagramKind`] - Closed set of datagram kinds (`Packet`, `Receipt`)
//! - [`Header`] - Source and destination chain of a datagram
//! - [`Datagram`] - Header plus an opaque [`PayloadEnvelope`]
//! - [`Payload`] - Capability set every payload type provides
//! - [`ReceiptSuccess`] / [`ReceiptFail`] - Acknowledgements for packets
//!
//! ## Encoding
//!
//! Stored values and query parameters use CBOR (see [`codec`]); query
//! responses are JSON.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod payload;
pub mod types;

pub use codec::{decode, encode, from_json, to_json};
pub use crypto::{Address, Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, PayloadError};
pub use keys::{egress_queue_prefix, index_key, ingress_counter_key};
pub use payload::{Payload, PayloadEnvelope, ReceiptFail, ReceiptSuccess};
pub use types::{validate_chain_id, Datagram, DatagramKind, Header, Proof, MAX_CHAIN_ID_LEN};
