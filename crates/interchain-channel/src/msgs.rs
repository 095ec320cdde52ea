//! Transaction messages submitted to the channel module.

use interchain_core::{
    codec, Address, Datagram, Ed25519PublicKey, Ed25519Signature, Keypair, Payload, Proof,
};
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, Result};

/// Domain separator prepended to the bytes a relayer signs.
pub const SIGN_DOMAIN: &[u8] = b"interchain/msg-receive/v1";

/// Delivers the datagram at `sequence` of a counterparty's egress queue.
///
/// The relayer is the signer. `proof` is carried but not verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgReceive {
    pub datagram: Datagram,
    pub sequence: u64,
    pub relayer: Address,
    #[serde(default)]
    pub proof: Option<Proof>,
}

impl MsgReceive {
    pub fn new(datagram: Datagram, sequence: u64, relayer: Address) -> Self {
        Self {
            datagram,
            sequence,
            relayer,
            proof: None,
        }
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    /// Stateless checks: addressing, payload validity, relayer identity.
    pub fn validate_basic(&self) -> Result<()> {
        self.datagram
            .header
            .validate()
            .map_err(|e| ChannelError::InvalidArgument(e.to_string()))?;
        self.datagram.payload.validate_basic()?;
        if self.relayer.is_zero() {
            return Err(ChannelError::InvalidArgument("empty relayer address".into()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.relayer]
    }

    /// Bytes covered by the relayer's signature.
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = SIGN_DOMAIN.to_vec();
        bytes.extend_from_slice(&codec::encode(self)?);
        Ok(bytes)
    }
}

/// A [`MsgReceive`] with the relayer's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub msg: MsgReceive,
    pub public_key: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl SignedTx {
    pub fn sign(msg: MsgReceive, keypair: &Keypair) -> Result<Self> {
        let signature = keypair.sign(&msg.sign_bytes()?);
        Ok(Self {
            msg,
            public_key: keypair.public_key(),
            signature,
        })
    }

    /// Check that the key belongs to the relayer and signed the message.
    pub fn verify(&self) -> Result<()> {
        if self.public_key.address() != self.msg.relayer {
            return Err(ChannelError::Unauthorized(format!(
                "key {} does not belong to relayer {}",
                self.public_key.address(),
                self.msg.relayer
            )));
        }
        self.public_key
            .verify(&self.msg.sign_bytes()?, &self.signature)
            .map_err(|e| ChannelError::Unauthorized(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec::encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(codec::decode(bytes)?)
    }
}
