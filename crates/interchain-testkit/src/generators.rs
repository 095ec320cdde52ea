//! Proptest strategies for channel tests.

use proptest::prelude::*;

use interchain_core::{Address, Datagram, DatagramKind, Header, Keypair, PayloadEnvelope};

use crate::transfer::TransferPayload;

/// A valid chain ID.
pub fn chain_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Two distinct chain IDs.
pub fn chain_pair() -> impl Strategy<Value = (String, String)> {
    (chain_id(), chain_id()).prop_filter("chains must differ", |(a, b)| a != b)
}

pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// A non-zero address.
pub fn address() -> impl Strategy<Value = Address> {
    keypair().prop_map(|kp| kp.address())
}

/// A packet envelope with an arbitrary tag and body.
pub fn packet_envelope() -> impl Strategy<Value = PayloadEnvelope> {
    (
        "[a-z]{1,8}/[a-z]{1,8}",
        address(),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(type_tag, signer, body)| PayloadEnvelope {
            type_tag,
            kind: DatagramKind::Packet,
            signers: vec![signer],
            body: body.into(),
        })
}

/// A packet datagram between two distinct chains.
pub fn packet() -> impl Strategy<Value = Datagram> {
    (chain_pair(), packet_envelope())
        .prop_map(|((source, destination), payload)| {
            Datagram::new(Header::new(source, destination), payload)
        })
}

pub fn transfer() -> impl Strategy<Value = TransferPayload> {
    (address(), address(), "[a-z]{1,8}", 1u64..1_000_000).prop_map(
        |(sender, receiver, denom, amount)| TransferPayload {
            sender,
            receiver,
            denom,
            amount,
        },
    )
}

/// Claimed ingress indices, mostly near the front so some are accepted.
pub fn claims(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..8, 1..=max_len)
}
