//! Payload capability set and the wire envelope that carries payloads.
//!
//! Payload types are contributed by other modules. The channel core only
//! sees them through the [`Payload`] capability set; on the wire and in the
//! egress queues they travel as a [`PayloadEnvelope`], a type-tagged opaque
//! body. Handlers decode the body back into their concrete type.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::Address;
use crate::error::{CoreError, PayloadError};
use crate::types::DatagramKind;

/// Capabilities every payload type provides.
pub trait Payload {
    /// Stable string tag used to route the payload to its handler.
    fn type_tag(&self) -> &str;

    /// Stateless sanity checks.
    fn validate_basic(&self) -> Result<(), PayloadError>;

    /// Identities that must authorize this payload, in order.
    fn signers(&self) -> Vec<Address>;

    /// Which queue kind this payload travels on.
    fn datagram_kind(&self) -> DatagramKind;
}

/// Type-tagged, encoded payload as stored in queues and sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEnvelope {
    pub type_tag: String,
    pub kind: DatagramKind,
    pub signers: Vec<Address>,
    pub body: Bytes,
}

impl PayloadEnvelope {
    /// Encode a concrete payload into an envelope.
    pub fn wrap<P: Payload + Serialize>(payload: &P) -> Result<Self, CoreError> {
        Ok(Self {
            type_tag: payload.type_tag().to_string(),
            kind: payload.datagram_kind(),
            signers: payload.signers(),
            body: Bytes::from(codec::encode(payload)?),
        })
    }

    /// Decode the body into a concrete payload type.
    pub fn decode<P: DeserializeOwned>(&self) -> Result<P, CoreError> {
        codec::decode(&self.body)
    }

    pub fn is_receipt(&self) -> bool {
        self.type_tag == ReceiptSuccess::TYPE_TAG || self.type_tag == ReceiptFail::TYPE_TAG
    }

    /// For receipts, the packet being acknowledged. `None` for packets.
    pub fn acknowledged_packet(&self) -> Result<Option<PayloadEnvelope>, CoreError> {
        if self.type_tag == ReceiptSuccess::TYPE_TAG {
            Ok(Some(self.decode::<ReceiptSuccess>()?.packet))
        } else if self.type_tag == ReceiptFail::TYPE_TAG {
            Ok(Some(self.decode::<ReceiptFail>()?.packet))
        } else {
            Ok(None)
        }
    }
}

impl Payload for PayloadEnvelope {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn validate_basic(&self) -> Result<(), PayloadError> {
        if self.type_tag.is_empty() {
            return Err(PayloadError::EmptyTypeTag);
        }
        if self.signers.is_empty() {
            return Err(PayloadError::NoSigners);
        }

        // Receipt tags are reserved for the receipt kind and vice versa.
        match (self.kind, self.is_receipt()) {
            (DatagramKind::Receipt, true) => self.validate_receipt_body(),
            (DatagramKind::Packet, false) => Ok(()),
            (kind, _) => Err(PayloadError::KindMismatch {
                expected: if self.is_receipt() {
                    DatagramKind::Receipt.to_string()
                } else {
                    DatagramKind::Packet.to_string()
                },
                got: kind.to_string(),
            }),
        }
    }

    fn signers(&self) -> Vec<Address> {
        self.signers.clone()
    }

    fn datagram_kind(&self) -> DatagramKind {
        self.kind
    }
}

impl PayloadEnvelope {
    fn validate_receipt_body(&self) -> Result<(), PayloadError> {
        let invalid = |e: CoreError| PayloadError::Invalid(e.to_string());
        if self.type_tag == ReceiptSuccess::TYPE_TAG {
            self.decode::<ReceiptSuccess>().map_err(invalid)?.validate_basic()
        } else {
            self.decode::<ReceiptFail>().map_err(invalid)?.validate_basic()
        }
    }
}

/// Acknowledgement that a packet was processed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSuccess {
    pub packet: PayloadEnvelope,
}

impl ReceiptSuccess {
    pub const TYPE_TAG: &'static str = "receipt/success";
}

impl Payload for ReceiptSuccess {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn validate_basic(&self) -> Result<(), PayloadError> {
        validate_acknowledged_packet(&self.packet)
    }

    fn signers(&self) -> Vec<Address> {
        self.packet.signers.clone()
    }

    fn datagram_kind(&self) -> DatagramKind {
        DatagramKind::Receipt
    }
}

/// Acknowledgement that a packet's handler failed.
///
/// The source chain can react to it, e.g. by refunding escrowed funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFail {
    pub packet: PayloadEnvelope,
    pub reason: String,
}

impl ReceiptFail {
    pub const TYPE_TAG: &'static str = "receipt/fail";
}

impl Payload for ReceiptFail {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn validate_basic(&self) -> Result<(), PayloadError> {
        validate_acknowledged_packet(&self.packet)
    }

    fn signers(&self) -> Vec<Address> {
        self.packet.signers.clone()
    }

    fn datagram_kind(&self) -> DatagramKind {
        DatagramKind::Receipt
    }
}

fn validate_acknowledged_packet(packet: &PayloadEnvelope) -> Result<(), PayloadError> {
    if packet.kind != DatagramKind::Packet {
        return Err(PayloadError::KindMismatch {
            expected: DatagramKind::Packet.to_string(),
            got: packet.kind.to_string(),
        });
    }
    packet.validate_basic()
}
