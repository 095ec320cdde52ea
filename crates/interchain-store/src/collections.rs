//! Typed collections over a [`KvStore`]: append-only lists and single values.

use std::marker::PhantomData;

use interchain_core::keys::{index_key, parse_index_key};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::prefix::PrefixStore;
use crate::traits::{KvStore, KvStoreExt};

/// Append-only list addressable by zero-based index.
///
/// Layout under the list prefix:
///
/// ```text
/// prefix                 -> length (CBOR u64)
/// prefix || be_u64(i)    -> item i (CBOR)
/// ```
///
/// The length lives at the bare prefix, so reading it is a single point
/// lookup regardless of how many items the list holds. Items are never
/// mutated or removed.
pub struct Linear<'a, T> {
    store: PrefixStore<'a>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Serialize + DeserializeOwned> Linear<'a, T> {
    pub fn new(parent: &'a dyn KvStore, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            store: PrefixStore::new(parent, prefix),
            _marker: PhantomData,
        }
    }

    /// Number of items, i.e. the index the next push will receive.
    pub fn len(&self) -> Result<u64> {
        Ok(self.store.get_decoded::<u64>(&[])?.unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Item at `index`, or `None` if `index >= len()`.
    pub fn get(&self, index: u64) -> Result<Option<T>> {
        // A sibling list whose prefix extends ours by exactly 8 bytes keeps
        // its length at one of our item keys; only indices below len() are
        // ours.
        if index >= self.len()? {
            return Ok(None);
        }
        self.store.get_decoded(&index_key(index))
    }

    /// Append an item and return its index.
    pub fn push(&self, item: &T) -> Result<u64> {
        let index = self.len()?;
        let next = index
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidData("list length overflow".into()))?;
        self.store.set_encoded(&index_key(index), item)?;
        self.store.set_encoded(&[], &next)?;
        Ok(index)
    }

    /// Items with `start <= index < end`, in index order.
    pub fn iterate(&self, start: u64, end: u64) -> Result<Vec<(u64, T)>> {
        let end = end.min(self.len()?);
        if end <= start {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .range(&index_key(start), Some(&index_key(end)))?;

        let mut items = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            // Only exact 8-byte suffixes are items of this list.
            let Some(index) = parse_index_key(&key) else {
                continue;
            };
            items.push((index, interchain_core::decode(&value)?));
        }
        Ok(items)
    }
}

/// A single mutable value stored at a fixed key.
pub struct Value<'a, T> {
    store: &'a dyn KvStore,
    key: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Serialize + DeserializeOwned> Value<'a, T> {
    pub fn new(store: &'a dyn KvStore, key: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Result<Option<T>> {
        self.store.get_decoded(&self.key)
    }

    pub fn set(&self, value: &T) -> Result<()> {
        self.store.set_encoded(&self.key, value)
    }

    pub fn exists(&self) -> Result<bool> {
        self.store.has(&self.key)
    }
}

impl<T: Serialize + DeserializeOwned + Default> Value<'_, T> {
    /// Stored value, or `T::default()` if never set.
    pub fn get_or_default(&self) -> Result<T> {
        Ok(self.get()?.unwrap_or_default())
    }
}
