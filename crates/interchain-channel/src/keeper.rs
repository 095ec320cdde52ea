//! The channel keeper: handler, send and query surfaces of the module.

use interchain_core::{
    codec, Datagram, DatagramKind, Header, Payload, PayloadEnvelope, ReceiptFail, ReceiptSuccess,
};
use interchain_store::{CacheKv, KvStore};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{ChannelError, Result};
use crate::handler::{HandlerOutcome, HandlerRegistry};
use crate::msgs::MsgReceive;
use crate::query::QueryRequest;
use crate::runtime::ChannelRuntime;

/// Configuration fixed at wiring time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperConfig {
    /// Module name; hosts route `/custom/<module_name>/...` queries here.
    pub module_name: String,
    /// Prefix of the module's region in the chain's store.
    pub store_prefix: Vec<u8>,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            module_name: "ibc".to_string(),
            store_prefix: b"ibc/".to_vec(),
        }
    }
}

/// What happened to a delivered payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryResult {
    Success,
    Failed { reason: String },
}

/// Result of an accepted [`MsgReceive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveOutcome {
    pub kind: DatagramKind,
    pub source_chain: String,
    pub sequence: u64,
    pub result: DeliveryResult,
    /// Index of the emitted receipt on the (Receipt, source) egress queue.
    /// `None` for receipts, which are never acknowledged.
    pub receipt_index: Option<u64>,
}

/// The channel module.
///
/// Stateless between calls: all channel state lives in the store handed to
/// each operation, under [`KeeperConfig::store_prefix`].
#[derive(Debug, Clone)]
pub struct Keeper {
    config: KeeperConfig,
    handlers: HandlerRegistry,
}

impl Keeper {
    pub fn new(config: KeeperConfig, handlers: HandlerRegistry) -> Self {
        Self { config, handlers }
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// View of the (kind, counterparty) channel in `store`.
    pub fn channel_runtime<'a>(
        &self,
        store: &'a dyn KvStore,
        kind: DatagramKind,
        counterparty: &str,
    ) -> ChannelRuntime<'a> {
        ChannelRuntime::new(store, &self.config.store_prefix, kind, counterparty)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Send
    // ─────────────────────────────────────────────────────────────────────────

    /// Enqueue a packet for `destination`. Returns its egress index.
    pub fn send(
        &self,
        ctx: &Context,
        store: &dyn KvStore,
        destination: &str,
        payload: PayloadEnvelope,
    ) -> Result<u64> {
        let header = Header::new(ctx.chain_id.clone(), destination);
        header
            .validate()
            .map_err(|e| ChannelError::InvalidArgument(e.to_string()))?;
        payload.validate_basic()?;
        if payload.kind != DatagramKind::Packet {
            return Err(ChannelError::InvalidArgument(format!(
                "only packets can be sent, got {}",
                payload.kind
            )));
        }

        let datagram = Datagram::new(header, payload);
        let digest = datagram.digest()?;
        let index = self
            .channel_runtime(store, DatagramKind::Packet, destination)
            .push_egress(&datagram)?;

        tracing::info!(
            destination,
            index,
            type_tag = %datagram.payload.type_tag,
            %digest,
            "packet enqueued"
        );
        Ok(index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Receive
    // ─────────────────────────────────────────────────────────────────────────

    /// Process a delivered datagram.
    ///
    /// Rejected messages (invalid, misaddressed, out of sequence) change no
    /// state. Accepted messages always advance the ingress counter by one,
    /// whether or not the payload handler succeeds.
    pub fn handle_receive(
        &self,
        ctx: &Context,
        store: &dyn KvStore,
        msg: &MsgReceive,
    ) -> Result<ReceiveOutcome> {
        msg.validate_basic()?;

        let datagram = &msg.datagram;
        let digest = datagram.digest()?;
        let header = &datagram.header;
        if header.destination_chain != ctx.chain_id {
            return Err(ChannelError::InvalidArgument(format!(
                "datagram addressed to {}, this chain is {}",
                header.destination_chain, ctx.chain_id
            )));
        }

        let kind = datagram.kind();
        let runtime = self.channel_runtime(store, kind, &header.source_chain);
        let expected = runtime.ingress_counter()?;
        if msg.sequence != expected {
            return Err(ChannelError::SequenceMismatch {
                kind,
                chain: header.source_chain.clone(),
                expected,
                got: msg.sequence,
            });
        }
        let next = expected
            .checked_add(1)
            .ok_or_else(|| ChannelError::InvalidArgument("ingress counter overflow".into()))?;

        let result = self.dispatch(ctx, store, datagram)?;
        runtime.set_ingress_counter(next)?;

        let receipt_index = match kind {
            DatagramKind::Packet => Some(self.emit_receipt(store, datagram, &result)?),
            DatagramKind::Receipt => None,
        };

        tracing::info!(
            %kind,
            source = %header.source_chain,
            sequence = msg.sequence,
            relayer = %msg.relayer,
            %digest,
            success = matches!(result, DeliveryResult::Success),
            "datagram received"
        );

        Ok(ReceiveOutcome {
            kind,
            source_chain: header.source_chain.clone(),
            sequence: msg.sequence,
            result,
            receipt_index,
        })
    }

    /// Run the handler on a write buffer, committing only on success.
    ///
    /// Packets route by their own type tag, receipts by the tag of the
    /// packet they acknowledge. Handler errors and unroutable packets become
    /// failures; a receipt nobody handles is simply consumed.
    fn dispatch(
        &self,
        ctx: &Context,
        store: &dyn KvStore,
        datagram: &Datagram,
    ) -> Result<DeliveryResult> {
        let type_tag = match datagram.payload.acknowledged_packet()? {
            Some(packet) => packet.type_tag,
            None => datagram.payload.type_tag.clone(),
        };

        let Some(handler) = self.handlers.get(&type_tag) else {
            if datagram.kind() == DatagramKind::Receipt {
                tracing::debug!(%type_tag, "no handler for receipt");
                return Ok(DeliveryResult::Success);
            }
            let err = ChannelError::UnknownPayload(type_tag);
            tracing::warn!(error = %err, "undeliverable payload");
            return Ok(DeliveryResult::Failed {
                reason: err.to_string(),
            });
        };

        let cache = CacheKv::new(store);
        match handler.handle(ctx, &cache, datagram) {
            Ok(HandlerOutcome::Success) => {
                cache.write()?;
                Ok(DeliveryResult::Success)
            }
            Ok(HandlerOutcome::Failed(reason)) => {
                tracing::debug!(%type_tag, %reason, "payload rejected by handler");
                Ok(DeliveryResult::Failed { reason })
            }
            Err(e) => {
                let err = ChannelError::PayloadHandlerFailure {
                    type_tag,
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, "payload handler failed");
                Ok(DeliveryResult::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn emit_receipt(
        &self,
        store: &dyn KvStore,
        packet: &Datagram,
        result: &DeliveryResult,
    ) -> Result<u64> {
        let payload = match result {
            DeliveryResult::Success => PayloadEnvelope::wrap(&ReceiptSuccess {
                packet: packet.payload.clone(),
            })?,
            DeliveryResult::Failed { reason } => PayloadEnvelope::wrap(&ReceiptFail {
                packet: packet.payload.clone(),
                reason: reason.clone(),
            })?,
        };
        let receipt = Datagram::new(packet.header.inverse_direction(), payload);
        self.channel_runtime(store, DatagramKind::Receipt, &packet.header.source_chain)
            .push_egress(&receipt)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query
    // ─────────────────────────────────────────────────────────────────────────

    /// Serve a read-only query. Returns JSON.
    pub fn query(&self, store: &dyn KvStore, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let request = QueryRequest::parse(path, data)?;
        tracing::trace!(path = request.path(), "query");

        let bytes = match request {
            QueryRequest::EgressDatagram {
                dest_chain,
                kind,
                sequence,
            } => codec::to_json(&self.channel_runtime(store, kind, &dest_chain).egress_at(sequence)?)?,
            QueryRequest::EgressIndex { dest_chain, kind } => {
                codec::to_json(&self.channel_runtime(store, kind, &dest_chain).egress_length()?)?
            }
            QueryRequest::IngressIndex { src_chain, kind } => {
                codec::to_json(&self.channel_runtime(store, kind, &src_chain).ingress_counter()?)?
            }
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handler::HandlerResult;
    use crate::query::{QueryEgressDatagramParams, EGRESS_DATAGRAM, EGRESS_INDEX, INGRESS_INDEX};
    use interchain_core::{Address, Keypair};
    use interchain_store::{KvStoreExt, MemoryKv};
    use proptest::prelude::*;

    const A: &str = "chain-a";
    const B: &str = "chain-b";

    fn envelope(type_tag: &str, body: &[u8]) -> PayloadEnvelope {
        PayloadEnvelope {
            type_tag: type_tag.into(),
            kind: DatagramKind::Packet,
            signers: vec![Address::from_bytes([5; 20])],
            body: body.to_vec().into(),
        }
    }

    fn packet(type_tag: &str, body: &[u8]) -> Datagram {
        Datagram::new(Header::new(A, B), envelope(type_tag, body))
    }

    fn relayer() -> Address {
        Keypair::from_seed(&[3; 32]).address()
    }

    /// "note" writes its body under `notes/`; "reject" writes then declines;
    /// "boom" writes then errors.
    fn keeper() -> Keeper {
        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "note",
                |_: &Context, store: &dyn KvStore, dg: &Datagram| -> HandlerResult {
                    store.set(b"notes/last", &dg.payload.body)?;
                    Ok(HandlerOutcome::Success)
                },
            )
            .unwrap();
        registry
            .register(
                "reject",
                |_: &Context, store: &dyn KvStore, _: &Datagram| -> HandlerResult {
                    store.set(b"notes/rejected", b"1")?;
                    Ok(HandlerOutcome::Failed("not today".into()))
                },
            )
            .unwrap();
        registry
            .register(
                "boom",
                |_: &Context, store: &dyn KvStore, _: &Datagram| -> HandlerResult {
                    store.set(b"notes/boom", b"1")?;
                    Err(HandlerError::new("exploded"))
                },
            )
            .unwrap();
        Keeper::new(KeeperConfig::default(), registry)
    }

    fn ctx_b() -> Context {
        Context::new(B, 10, 1_700_000_000_000)
    }

    fn receipts_for_a(keeper: &Keeper, kv: &MemoryKv) -> Vec<Datagram> {
        keeper
            .channel_runtime(kv, DatagramKind::Receipt, A)
            .egress_range(0, u64::MAX)
            .unwrap()
            .into_iter()
            .map(|(_, d)| d)
            .collect()
    }

    #[test]
    fn test_send_assigns_consecutive_indices() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let ctx = Context::new(A, 1, 0);
        for expected in 0..3 {
            let index = keeper.send(&ctx, &kv, B, envelope("note", b"x")).unwrap();
            assert_eq!(index, expected);
        }
        let rt = keeper.channel_runtime(&kv, DatagramKind::Packet, B);
        assert_eq!(rt.egress_length().unwrap(), 3);
        assert_eq!(rt.egress_at(2).unwrap().header, Header::new(A, B));
    }

    #[test]
    fn test_send_rejects_self_and_receipts() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let ctx = Context::new(A, 1, 0);
        assert!(keeper.send(&ctx, &kv, A, envelope("note", b"x")).is_err());

        let mut receipt = envelope("note", b"x");
        receipt.kind = DatagramKind::Receipt;
        assert!(keeper.send(&ctx, &kv, B, receipt).is_err());
        assert!(kv.is_empty().unwrap());
    }

    #[test]
    fn test_receive_success_commits_and_acknowledges() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let msg = MsgReceive::new(packet("note", b"hello"), 0, relayer());

        let outcome = keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap();
        assert_eq!(outcome.result, DeliveryResult::Success);
        assert_eq!(outcome.receipt_index, Some(0));
        assert_eq!(kv.get(b"notes/last").unwrap(), Some(b"hello".to_vec()));

        let rt = keeper.channel_runtime(&kv, DatagramKind::Packet, A);
        assert_eq!(rt.ingress_counter().unwrap(), 1);

        let receipts = receipts_for_a(&keeper, &kv);
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].header, Header::new(B, A));
        assert_eq!(receipts[0].payload.type_tag, ReceiptSuccess::TYPE_TAG);
        let ack: ReceiptSuccess = receipts[0].payload.decode().unwrap();
        assert_eq!(ack.packet, msg.datagram.payload);
    }

    #[test]
    fn test_receive_out_of_sequence_changes_nothing() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let msg = MsgReceive::new(packet("note", b"hello"), 1, relayer());

        match keeper.handle_receive(&ctx_b(), &kv, &msg) {
            Err(ChannelError::SequenceMismatch { expected, got, .. }) => {
                assert_eq!(expected, 0);
                assert_eq!(got, 1);
            }
            other => panic!("expected SequenceMismatch, got {other:?}"),
        }
        assert!(kv.is_empty().unwrap());
    }

    #[test]
    fn test_resubmission_is_rejected() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let msg = MsgReceive::new(packet("note", b"hello"), 0, relayer());
        keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap();
        let before = kv.snapshot().unwrap();

        let err = keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap_err();
        assert_eq!(err.code(), 4);
        assert_eq!(kv.snapshot().unwrap(), before);
    }

    #[test]
    fn test_misaddressed_datagram_rejected() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let msg = MsgReceive::new(packet("note", b"hello"), 0, relayer());
        let ctx = Context::new("chain-c", 1, 0);
        assert!(matches!(
            keeper.handle_receive(&ctx, &kv, &msg),
            Err(ChannelError::InvalidArgument(_))
        ));
        assert!(kv.is_empty().unwrap());
    }

    #[test]
    fn test_handler_failure_discards_writes_and_still_advances() {
        let keeper = keeper();
        let kv = MemoryKv::new();

        for (seq, tag) in ["reject", "boom", "unregistered"].into_iter().enumerate() {
            let msg = MsgReceive::new(packet(tag, b"x"), seq as u64, relayer());
            let outcome = keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap();
            assert!(matches!(outcome.result, DeliveryResult::Failed { .. }), "{tag}");
        }

        assert!(!kv.has(b"notes/rejected").unwrap());
        assert!(!kv.has(b"notes/boom").unwrap());
        assert_eq!(
            keeper
                .channel_runtime(&kv, DatagramKind::Packet, A)
                .ingress_counter()
                .unwrap(),
            3
        );

        let receipts = receipts_for_a(&keeper, &kv);
        assert_eq!(receipts.len(), 3);
        let reasons: Vec<String> = receipts
            .iter()
            .map(|r| r.payload.decode::<ReceiptFail>().unwrap().reason)
            .collect();
        assert_eq!(reasons[0], "not today");
        assert!(reasons[1].contains("exploded"));
        assert!(reasons[2].contains("unregistered"));
    }

    #[test]
    fn test_receipts_are_not_acknowledged() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let ack = PayloadEnvelope::wrap(&ReceiptSuccess {
            packet: envelope("note", b"x"),
        })
        .unwrap();
        // A receipt travelling A -> B, acknowledging a packet B once sent.
        let msg = MsgReceive::new(Datagram::new(Header::new(A, B), ack), 0, relayer());

        let outcome = keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap();
        assert_eq!(outcome.kind, DatagramKind::Receipt);
        assert_eq!(outcome.result, DeliveryResult::Success);
        assert_eq!(outcome.receipt_index, None);
        // Routed to the handler of the acknowledged packet.
        assert!(kv.has(b"notes/last").unwrap());
        assert_eq!(
            keeper
                .channel_runtime(&kv, DatagramKind::Receipt, A)
                .ingress_counter()
                .unwrap(),
            1
        );
        assert!(receipts_for_a(&keeper, &kv).is_empty());
    }

    #[test]
    fn test_unhandled_receipt_is_consumed() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let ack = PayloadEnvelope::wrap(&ReceiptFail {
            packet: envelope("unregistered", b"x"),
            reason: "whatever".into(),
        })
        .unwrap();
        let msg = MsgReceive::new(Datagram::new(Header::new(A, B), ack), 0, relayer());

        let outcome = keeper.handle_receive(&ctx_b(), &kv, &msg).unwrap();
        assert_eq!(outcome.result, DeliveryResult::Success);
        let rt = keeper.channel_runtime(&kv, DatagramKind::Receipt, A);
        assert_eq!(rt.ingress_counter().unwrap(), 1);
    }

    #[test]
    fn test_query_paths() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let ctx = Context::new(A, 1, 0);
        keeper.send(&ctx, &kv, B, envelope("note", b"q")).unwrap();

        let length = keeper
            .query(
                &kv,
                EGRESS_INDEX,
                &QueryRequest::EgressIndex {
                    dest_chain: B.into(),
                    kind: DatagramKind::Packet,
                }
                .encode_params()
                .unwrap(),
            )
            .unwrap();
        assert_eq!(codec::from_json::<u64>(&length).unwrap(), 1);

        let params = codec::encode(&QueryEgressDatagramParams {
            dest_chain: B.into(),
            datagram_kind: 0,
            sequence: 0,
        })
        .unwrap();
        let datagram: Datagram =
            codec::from_json(&keeper.query(&kv, EGRESS_DATAGRAM, &params).unwrap()).unwrap();
        assert_eq!(datagram.payload.body.as_ref(), b"q");

        let counter = keeper
            .query(
                &kv,
                INGRESS_INDEX,
                &QueryRequest::IngressIndex {
                    src_chain: B.into(),
                    kind: DatagramKind::Receipt,
                }
                .encode_params()
                .unwrap(),
            )
            .unwrap();
        assert_eq!(codec::from_json::<u64>(&counter).unwrap(), 0);
    }

    #[test]
    fn test_query_missing_datagram() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        let params = QueryRequest::EgressDatagram {
            dest_chain: B.into(),
            kind: DatagramKind::Packet,
            sequence: 0,
        }
        .encode_params()
        .unwrap();
        assert!(matches!(
            keeper.query(&kv, EGRESS_DATAGRAM, &params),
            Err(ChannelError::NotFound { index: 0, length: 0 })
        ));
    }

    #[test]
    fn test_query_does_not_write() {
        let keeper = keeper();
        let kv = MemoryKv::new();
        kv.set_encoded(b"unrelated", &1u64).unwrap();
        let before = kv.snapshot().unwrap();
        let _ = keeper.query(&kv, "ingress-index", b"garbage");
        let _ = keeper.query(&kv, "nope", &[]);
        assert_eq!(kv.snapshot().unwrap(), before);
    }

    proptest! {
        #[test]
        fn only_the_expected_index_is_accepted(claims in prop::collection::vec(0u64..6, 1..40)) {
            let keeper = keeper();
            let kv = MemoryKv::new();
            let mut accepted = Vec::new();

            for claim in claims {
                let msg = MsgReceive::new(packet("note", &claim.to_be_bytes()), claim, relayer());
                if keeper.handle_receive(&ctx_b(), &kv, &msg).is_ok() {
                    accepted.push(claim);
                }
            }

            let expected: Vec<u64> = (0..accepted.len() as u64).collect();
            prop_assert_eq!(&accepted, &expected);
            let rt = keeper.channel_runtime(&kv, DatagramKind::Packet, A);
            prop_assert_eq!(rt.ingress_counter().unwrap(), accepted.len() as u64);
            prop_assert_eq!(receipts_for_a(&keeper, &kv).len(), accepted.len());
        }
    }
}
