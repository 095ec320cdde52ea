//! # Interchain Relayer
//!
//! Off-chain process that moves datagrams from a source chain's egress
//! queue to a destination chain, one signed [`MsgReceive`] per index.
//!
//! The relayer is untrusted and keeps no state of its own: every cycle
//! re-reads the source's egress length and the destination's ingress
//! counter and submits the gap in order. Two relayers with swapped
//! endpoints form a bidirectional relay.
//!
//! [`MsgReceive`]: interchain_channel::MsgReceive

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod rpc;

pub use client::ChainClient;
pub use config::RelayerConfig;
pub use error::{RelayerError, Result};
pub use relay::{RelayReport, Relayer};
pub use rpc::RpcClient;
