//! KvStore trait: the ordered byte-keyed store the channel module runs on.
//!
//! The host chain applies transactions one at a time, so the interface is
//! synchronous. Implementations use interior mutability so that nested
//! views ([`PrefixStore`](crate::PrefixStore), [`CacheKv`](crate::CacheKv))
//! can share a parent by reference.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;

/// A key and its value, as returned by range scans.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A batch of writes: `Some(value)` sets, `None` deletes.
pub type WriteBatch = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// Ordered byte-keyed store.
pub trait KvStore: Send + Sync {
    /// Get the value at `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Set the value at `key`, replacing any previous value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Entries with `start <= key < end`, ascending by key.
    ///
    /// `end = None` means unbounded.
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>>;

    /// Check whether `key` holds a value.
    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply a batch of writes in order.
    ///
    /// Backends with native transactions override this to make the batch
    /// atomic.
    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        for (key, value) in batch {
            match value {
                Some(value) => self.set(&key, &value)?,
                None => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        (**self).range(start, end)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        (**self).apply_batch(batch)
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        (**self).range(start, end)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        (**self).apply_batch(batch)
    }
}

/// Extension trait for typed access through the binary codec.
pub trait KvStoreExt: KvStore {
    /// Get and decode the value at `key`.
    fn get_decoded<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(interchain_core::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and set the value at `key`.
    fn set_encoded<T: Serialize + ?Sized>(&self, key: &[u8], value: &T) -> Result<()> {
        let bytes = interchain_core::encode(value)?;
        self.set(key, &bytes)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}
