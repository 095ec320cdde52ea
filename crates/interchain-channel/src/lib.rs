//! # Interchain Channel
//!
//! Ordered, exactly-once datagram channels between chains.
//!
//! For every (kind, counterparty) pair a chain keeps an append-only egress
//! queue of datagrams addressed to the counterparty and an ingress counter
//! of datagrams accepted from it. A relayer copies the gap between a
//! source's egress length and a destination's ingress counter, one
//! [`MsgReceive`] per index. The destination accepts index `i` only when its
//! counter equals `i`, so delivery is in order, without gaps or duplicates.
//!
//! ## Surfaces
//!
//! - [`Keeper::send`] enqueues a packet for another chain.
//! - [`Keeper::handle_receive`] processes a delivered datagram, runs its
//!   payload handler and, for packets, emits a receipt.
//! - [`Keeper::query`] serves the read paths relayers poll
//!   (see [`query`]).
//!
//! ## Usage
//!
//! ```rust
//! use interchain_channel::{
//!     Context, HandlerOutcome, HandlerRegistry, HandlerResult, Keeper, KeeperConfig,
//! };
//! use interchain_core::{Address, Datagram, DatagramKind, PayloadEnvelope};
//! use interchain_store::{KvStore, MemoryKv};
//!
//! fn noop(_: &Context, _: &dyn KvStore, _: &Datagram) -> HandlerResult {
//!     Ok(HandlerOutcome::Success)
//! }
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("noop", noop).unwrap();
//! let keeper = Keeper::new(KeeperConfig::default(), handlers);
//!
//! let store = MemoryKv::new();
//! let ctx = Context::new("chain-a", 1, 0);
//! let payload = PayloadEnvelope {
//!     type_tag: "noop".into(),
//!     kind: DatagramKind::Packet,
//!     signers: vec![Address::from_bytes([1; 20])],
//!     body: Default::default(),
//! };
//! let index = keeper.send(&ctx, &store, "chain-b", payload).unwrap();
//! assert_eq!(index, 0);
//! ```

pub mod context;
pub mod error;
pub mod handler;
pub mod keeper;
pub mod msgs;
pub mod query;
pub mod runtime;

pub use context::Context;
pub use error::{ChannelError, HandlerError, Result};
pub use handler::{HandlerOutcome, HandlerRegistry, HandlerResult, PayloadHandler};
pub use keeper::{DeliveryResult, Keeper, KeeperConfig, ReceiveOutcome};
pub use msgs::{MsgReceive, SignedTx};
pub use query::{QueryRequest, QueryResponse};
pub use runtime::ChannelRuntime;
