//! In-memory implementation of the KvStore trait.
//!
//! Primarily for tests and in-process chains. Same ordering semantics as
//! SQLite, no persistence.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::{KvPair, KvStore, WriteBatch};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryKv {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.read()?.is_empty())
    }

    /// Copy of every entry, in key order.
    pub fn snapshot(&self) -> Result<Vec<KvPair>> {
        let inner = self.inner.read()?;
        Ok(inner.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read()?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.write()?.remove(key);
        Ok(())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        let inner = self.inner.read()?;
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        Ok(inner
            .range((Bound::Included(start.to_vec()), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        // One lock for the whole batch so readers never see half of it.
        let mut inner = self.inner.write()?;
        for (key, value) in batch {
            match value {
                Some(value) => {
                    inner.insert(key, value);
                }
                None => {
                    inner.remove(&key);
                }
            }
        }
        Ok(())
    }
}
