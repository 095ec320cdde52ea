//! Datagram types shared by the channel module and the relayer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec;
use crate::crypto::Blake3Hash;
use crate::error::CoreError;
use crate::payload::{Payload, PayloadEnvelope};

/// Maximum length of a chain identifier, in bytes.
pub const MAX_CHAIN_ID_LEN: usize = 64;

/// Discriminator for datagrams travelling over a channel.
///
/// The set is closed: any byte other than the listed values is rejected
/// at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum DatagramKind {
    /// Application payload travelling from source to destination.
    Packet = 0,
    /// Acknowledgement travelling back from destination to source.
    Receipt = 1,
}

impl DatagramKind {
    /// All kinds, in tag order.
    /// The single byte used in store keys and query parameters.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatagramKind::Packet => "packet",
            DatagramKind::Receipt => "receipt",
        }
    }
}

impl TryFrom<u8> for DatagramKind {
    type Error = CoreError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(DatagramKind::Packet),
            1 => Ok(DatagramKind::Receipt),
            other => Err(CoreError::InvalidKind(other)),
        }
    }
}

impl From<DatagramKind> for u8 {
    fn from(kind: DatagramKind) -> Self {
        kind.to_byte()
    }
}

impl fmt::Display for DatagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatagramKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packet" => Ok(DatagramKind::Packet),
            "receipt" => Ok(DatagramKind::Receipt),
            _ => Err(CoreError::DecodingError(format!("unknown datagram kind: {s}"))),
        }
    }
}

/// Check that a chain identifier is usable as a key component.
///
/// Chain ids must be non-empty, at most [`MAX_CHAIN_ID_LEN`] bytes, and
/// consist of printable ASCII without whitespace. An id may still extend
/// another by exactly 8 bytes, so queue readers bound every index by the
/// queue's stored length.
pub fn validate_chain_id(chain_id: &str) -> Result<(), CoreError> {
    if chain_id.is_empty() || chain_id.len() > MAX_CHAIN_ID_LEN {
        return Err(CoreError::InvalidChainId(chain_id.to_string()));
    }
    if !chain_id.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(CoreError::InvalidChainId(chain_id.to_string()));
    }
    Ok(())
}

/// Addressing information of a datagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    pub source_chain: String,
    pub destination_chain: String,
}

impl Header {
    pub fn new(source_chain: impl Into<String>, destination_chain: impl Into<String>) -> Self {
        Self {
            source_chain: source_chain.into(),
            destination_chain: destination_chain.into(),
        }
    }

    /// The same path travelled in the opposite direction.
    ///
    /// Receipts for a packet are addressed with the packet's inverse header.
    pub fn inverse_direction(&self) -> Header {
        Header {
            source_chain: self.destination_chain.clone(),
            destination_chain: self.source_chain.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_chain_id(&self.source_chain)?;
        validate_chain_id(&self.destination_chain)?;
        if self.source_chain == self.destination_chain {
            return Err(CoreError::InvalidChainId(format!(
                "source and destination are both {}",
                self.source_chain
            )));
        }
        Ok(())
    }
}

/// A header-addressed, typed payload transmitted between chains.
///
/// Immutable once pushed to an egress queue. Identity is positional: the
/// sender knows a datagram by `(kind, destination, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datagram {
    pub header: Header,
    pub payload: PayloadEnvelope,
}

impl Datagram {
    pub fn new(header: Header, payload: PayloadEnvelope) -> Self {
        Self { header, payload }
    }

    /// The kind reported by the carried payload.
    pub fn kind(&self) -> DatagramKind {
        self.payload.datagram_kind()
    }

    /// Content digest, used to correlate log lines across chains.
    pub fn digest(&self) -> Result<Blake3Hash, CoreError> {
        let bytes = codec::encode(self)?;
        Ok(Blake3Hash::hash(&bytes))
    }
}

/// Placeholder for a state-inclusion proof of a datagram on its source chain.
///
/// Carried structurally on receive messages; no verification scheme exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub height: u64,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_byte_boundary() {
        assert_eq!(DatagramKind::try_from(0).unwrap(), DatagramKind::Packet);
        assert_eq!(DatagramKind::try_from(1).unwrap(), DatagramKind::Receipt);
        assert!(matches!(
            DatagramKind::try_from(2),
            Err(CoreError::InvalidKind(2))
        ));
        assert!(DatagramKind::try_from(0xff).is_err());
    }

    #[test]
    fn test_kind_rejected_on_decode() {
        let bytes = crate::codec::encode(&7u8).unwrap();
        assert!(crate::codec::decode::<DatagramKind>(&bytes).is_err());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Packet".parse::<DatagramKind>().unwrap(), DatagramKind::Packet);
        assert_eq!(" receipt ".parse::<DatagramKind>().unwrap(), DatagramKind::Receipt);
        assert!("ack".parse::<DatagramKind>().is_err());
    }

    #[test]
    fn test_inverse_direction() {
        let header = Header::new("chain-a", "chain-b");
        let inverse = header.inverse_direction();
        assert_eq!(inverse.source_chain, "chain-b");
        assert_eq!(inverse.destination_chain, "chain-a");
        assert_eq!(inverse.inverse_direction(), header);
    }

    #[test]
    fn test_chain_id_validation() {
        assert!(validate_chain_id("chain-a").is_ok());
        assert!(validate_chain_id("").is_err());
        assert!(validate_chain_id("has space").is_err());
        assert!(validate_chain_id("nul\0").is_err());
        assert!(validate_chain_id(&"x".repeat(MAX_CHAIN_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_header_rejects_loopback() {
        assert!(Header::new("a", "a").validate().is_err());
        assert!(Header::new("a", "b").validate().is_ok());
    }
}
