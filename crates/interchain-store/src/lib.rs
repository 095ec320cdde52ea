//! # Interchain Store
//!
//! Ordered byte-keyed storage for the channel module.
//!
//! ## Overview
//!
//! The host chain's versioned store is consumed through the [`KvStore`]
//! trait: an ordered map from byte keys to byte values with range scans.
//! On top of it this crate provides
//!
//! - [`PrefixStore`] - a view that namespaces every key under a prefix
//! - [`CacheKv`] - a write buffer that is either flushed or dropped, giving
//!   commit-or-rollback semantics to a block of writes
//! - [`Linear`] - an append-only list addressable by index
//! - [`Value`] - a single mutable value
//!
//! ## Backends
//!
//! - [`MemoryKv`] - `BTreeMap` backed, for tests and in-process chains
//! - [`SqliteKv`] - persistent SQLite backend
//!
//! ## Usage
//!
//! ```rust
//! use interchain_store::{Linear, MemoryKv};
//!
//! let kv = MemoryKv::new();
//! let list: Linear<'_, String> = Linear::new(&kv, b"greetings".to_vec());
//! assert_eq!(list.push(&"hello".to_string()).unwrap(), 0);
//! assert_eq!(list.len().unwrap(), 1);
//! assert_eq!(list.get(0).unwrap().as_deref(), Some("hello"));
//! ```

pub mod cache;
pub mod collections;
pub mod error;
pub mod memory;
pub mod migration;
pub mod prefix;
pub mod sqlite;
pub mod traits;

pub use cache::CacheKv;
pub use collections::{Linear, Value};
pub use error::{Result, StoreError};
pub use memory::MemoryKv;
pub use prefix::{prefix_end, PrefixStore};
pub use sqlite::SqliteKv;
pub use traits::{KvPair, KvStore, KvStoreExt, WriteBatch};
