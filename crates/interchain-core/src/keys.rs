//! Byte-level key layout of channel state.
//!
//! ```text
//! egress queue    0x00 || kind || dest_chain_id || be_u64(index)
//! ingress counter 0x01 || kind || src_chain_id
//! ```
//!
//! Big-endian indices make lexicographic key order equal numeric order, so
//! range scans over a queue walk it in index order.

use crate::types::DatagramKind;

/// Tag byte of egress queue keys.
pub const EGRESS_QUEUE_TAG: u8 = 0x00;

/// Tag byte of ingress counter keys.
pub const INGRESS_COUNTER_TAG: u8 = 0x01;

/// Prefix under which the egress queue for `(kind, chain_id)` lives.
pub fn egress_queue_prefix(kind: DatagramKind, chain_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + chain_id.len());
    key.push(EGRESS_QUEUE_TAG);
    key.push(kind.to_byte());
    key.extend_from_slice(chain_id.as_bytes());
    key
}

/// Key of the ingress counter for `(kind, chain_id)`.
pub fn ingress_counter_key(kind: DatagramKind, chain_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + chain_id.len());
    key.push(INGRESS_COUNTER_TAG);
    key.push(kind.to_byte());
    key.extend_from_slice(chain_id.as_bytes());
    key
}

/// Order-preserving encoding of a list index.
pub fn index_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

/// Inverse of [`index_key`]. Returns `None` unless `bytes` is exactly 8 bytes.
pub fn parse_index_key(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}
