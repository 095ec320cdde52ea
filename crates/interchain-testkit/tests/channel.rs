//! Channel properties exercised through in-process chains.

use std::collections::BTreeMap;

use interchain_channel::{
    ChannelError, HandlerOutcome, HandlerRegistry, HandlerResult, Keeper, KeeperConfig,
    MsgReceive, SignedTx,
};
use interchain_core::{Datagram, DatagramKind, Header, Keypair, ReceiptFail, ReceiptSuccess};
use interchain_store::{KvStore, SqliteKv};
use interchain_testkit::{generators, TestChain};
use proptest::prelude::*;

fn relayer() -> Keypair {
    Keypair::from_seed(&[42; 32])
}

fn deliver(chain: &TestChain, datagram: Datagram, sequence: u64) -> Result<(), ChannelError> {
    let msg = MsgReceive::new(datagram, sequence, relayer().address());
    let tx = SignedTx::sign(msg, &relayer())?;
    chain.deliver(&tx).map(|_| ())
}

/// Accepts payloads whose body starts with anything but 0xff.
fn picky_registry(tags: &[String]) -> HandlerRegistry {
    fn picky(_: &interchain_channel::Context, _: &dyn KvStore, d: &Datagram) -> HandlerResult {
        if d.payload.body.first() == Some(&0xff) {
            Ok(HandlerOutcome::Failed("picky".into()))
        } else {
            Ok(HandlerOutcome::Success)
        }
    }
    let mut registry = HandlerRegistry::new();
    for tag in tags {
        if !registry.contains(tag) {
            registry.register(tag.clone(), picky).unwrap();
        }
    }
    registry
}

proptest! {
    #[test]
    fn egress_indices_are_consecutive_per_destination(
        sends in prop::collection::vec((0usize..3, generators::packet_envelope()), 1..30)
    ) {
        let chain = TestChain::new("chain-src", HandlerRegistry::new());
        let destinations = ["chain-x", "chain-y", "chain-z"];
        let mut expected: BTreeMap<&str, u64> = BTreeMap::new();

        for (dest, payload) in sends {
            let destination = destinations[dest];
            let index = chain.send(destination, payload).unwrap();
            let next = expected.entry(destination).or_default();
            prop_assert_eq!(index, *next);
            *next += 1;
        }

        for (destination, length) in expected {
            let observed = chain.read(|store| {
                chain
                    .keeper()
                    .channel_runtime(store, DatagramKind::Packet, destination)
                    .egress_length()
                    .unwrap()
            });
            prop_assert_eq!(observed, length);
        }
    }

    #[test]
    fn ingress_accepts_exactly_the_expected_index(
        payloads in prop::collection::vec(generators::packet_envelope(), 8),
        claims in generators::claims(40),
    ) {
        let tags: Vec<String> = payloads.iter().map(|p| p.type_tag.clone()).collect();
        let chain = TestChain::new("chain-b", picky_registry(&tags));
        let mut accepted = Vec::new();

        for claim in claims {
            let payload = payloads[claim as usize % payloads.len()].clone();
            let datagram = Datagram::new(Header::new("chain-a", "chain-b"), payload);
            match deliver(&chain, datagram, claim) {
                Ok(()) => accepted.push(claim),
                Err(ChannelError::SequenceMismatch { expected, got, .. }) => {
                    prop_assert_eq!(expected, accepted.len() as u64);
                    prop_assert_eq!(got, claim);
                }
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }

        let in_order: Vec<u64> = (0..accepted.len() as u64).collect();
        prop_assert_eq!(&accepted, &in_order);

        let (counter, receipts) = chain.read(|store| {
            let keeper = chain.keeper();
            (
                keeper
                    .channel_runtime(store, DatagramKind::Packet, "chain-a")
                    .ingress_counter()
                    .unwrap(),
                keeper
                    .channel_runtime(store, DatagramKind::Receipt, "chain-a")
                    .egress_length()
                    .unwrap(),
            )
        });
        prop_assert_eq!(counter, accepted.len() as u64);
        prop_assert_eq!(receipts, accepted.len() as u64);
    }
}

#[test]
fn rejected_submission_leaves_state_untouched() {
    let chain = TestChain::new("chain-b", picky_registry(&["app/ping".to_string()]));
    let payload = interchain_core::PayloadEnvelope {
        type_tag: "app/ping".into(),
        kind: DatagramKind::Packet,
        signers: vec![relayer().address()],
        body: vec![1].into(),
    };
    let datagram = Datagram::new(Header::new("chain-a", "chain-b"), payload);

    deliver(&chain, datagram.clone(), 0).unwrap();
    let before = chain.read(|store| store.range(&[], None).unwrap());

    let err = deliver(&chain, datagram.clone(), 0).unwrap_err();
    assert!(matches!(err, ChannelError::SequenceMismatch { expected: 1, got: 0, .. }));
    let err = deliver(&chain, datagram, 5).unwrap_err();
    assert!(matches!(err, ChannelError::SequenceMismatch { expected: 1, got: 5, .. }));

    assert_eq!(chain.read(|store| store.range(&[], None).unwrap()), before);
}

#[test]
fn forged_signature_is_rejected_before_execution() {
    let chain = TestChain::new("chain-b", HandlerRegistry::new());
    let payload = interchain_core::PayloadEnvelope {
        type_tag: "app/ping".into(),
        kind: DatagramKind::Packet,
        signers: vec![relayer().address()],
        body: vec![1].into(),
    };
    let msg = MsgReceive::new(
        Datagram::new(Header::new("chain-a", "chain-b"), payload),
        0,
        relayer().address(),
    );
    let mut tx = SignedTx::sign(msg, &relayer()).unwrap();
    tx.signature = Keypair::from_seed(&[1; 32]).sign(b"something else");

    assert!(matches!(chain.deliver(&tx), Err(ChannelError::Unauthorized(_))));
    assert_eq!(chain.height(), 0);
}

#[test]
fn receipts_mirror_handler_outcomes_in_order() {
    let chain = TestChain::new("chain-b", picky_registry(&["app/ping".to_string()]));
    let bodies: [&[u8]; 4] = [&[1], &[0xff], &[2], &[0xff, 0]];

    for (i, body) in bodies.iter().enumerate() {
        let payload = interchain_core::PayloadEnvelope {
            type_tag: "app/ping".into(),
            kind: DatagramKind::Packet,
            signers: vec![relayer().address()],
            body: body.to_vec().into(),
        };
        deliver(&chain, Datagram::new(Header::new("chain-a", "chain-b"), payload), i as u64)
            .unwrap();
    }

    let receipts = chain.read(|store| {
        chain
            .keeper()
            .channel_runtime(store, DatagramKind::Receipt, "chain-a")
            .egress_range(0, u64::MAX)
            .unwrap()
    });
    assert_eq!(receipts.len(), bodies.len());

    for ((index, receipt), body) in receipts.iter().zip(bodies) {
        assert_eq!(receipt.header, Header::new("chain-b", "chain-a"));
        assert_eq!(receipt.kind(), DatagramKind::Receipt);
        let packet = receipt.payload.acknowledged_packet().unwrap().unwrap();
        assert_eq!(packet.body.as_ref(), body, "receipt {index}");

        if body[0] == 0xff {
            let fail: ReceiptFail = receipt.payload.decode().unwrap();
            assert_eq!(fail.reason, "picky");
        } else {
            assert_eq!(receipt.payload.type_tag, ReceiptSuccess::TYPE_TAG);
        }
    }
}

#[test]
fn channel_state_survives_restart_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain-b.db");
    let payload = interchain_core::PayloadEnvelope {
        type_tag: "app/ping".into(),
        kind: DatagramKind::Packet,
        signers: vec![relayer().address()],
        body: vec![7].into(),
    };
    let datagram = Datagram::new(Header::new("chain-a", "chain-b"), payload);
    let open = || {
        let keeper = Keeper::new(
            KeeperConfig::default(),
            picky_registry(&["app/ping".to_string()]),
        );
        TestChain::with_store("chain-b", keeper, SqliteKv::open(&path).unwrap())
    };

    {
        let chain = open();
        deliver(&chain, datagram.clone(), 0).unwrap();
        deliver(&chain, datagram.clone(), 1).unwrap();
    }

    let chain = open();
    assert!(matches!(
        deliver(&chain, datagram.clone(), 1),
        Err(ChannelError::SequenceMismatch { expected: 2, .. })
    ));
    deliver(&chain, datagram, 2).unwrap();

    let receipts = chain.read(|store| {
        chain
            .keeper()
            .channel_runtime(store, DatagramKind::Receipt, "chain-a")
            .egress_length()
            .unwrap()
    });
    assert_eq!(receipts, 3);
    let last = chain.read(|store| {
        chain
            .keeper()
            .channel_runtime(store, DatagramKind::Receipt, "chain-a")
            .egress_at(2)
            .unwrap()
    });
    assert_eq!(last.payload.type_tag, ReceiptSuccess::TYPE_TAG);
}
