//! # Interchain Testkit
//!
//! Testing utilities for interchain channels.
//!
//! - [`TestChain`]: an in-process chain running the channel keeper, one
//!   transaction per block, with atomic commit.
//! - [`LocalClient`]: a relayer [`ChainClient`](interchain_relayer::ChainClient)
//!   over a `TestChain`, with submission failure injection.
//! - [`transfer`]: a small token transfer module exercising handlers,
//!   failure receipts and refunds.
//! - [`generators`]: proptest strategies.
//!
//! ```rust
//! use std::sync::Arc;
//! use interchain_testkit::{transfer, LocalClient, TestChain};
//!
//! let chain = Arc::new(TestChain::new("chain-a", transfer::transfer_registry().unwrap()));
//! let client = LocalClient::new(chain.clone());
//! assert_eq!(client.chain().height(), 0);
//! ```

pub mod chain;
pub mod client;
pub mod generators;
pub mod transfer;

pub use chain::TestChain;
pub use client::LocalClient;
pub use transfer::{TransferHandler, TransferPayload};
