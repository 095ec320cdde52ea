//! Write-buffering view with commit-or-discard semantics.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::{KvPair, KvStore, WriteBatch};

/// Buffers writes on top of a parent store.
///
/// Reads see the buffered writes layered over the parent. [`CacheKv::write`]
/// flushes the buffer to the parent as a single batch; dropping the cache
/// discards it. Caches nest, so an inner unit of work can be rolled back
/// without touching the outer one.
pub struct CacheKv<'a> {
    parent: &'a dyn KvStore,
    /// `None` marks a buffered delete.
    writes: RwLock<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> CacheKv<'a> {
    pub fn new(parent: &'a dyn KvStore) -> Self {
        Self {
            parent,
            writes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of buffered writes (sets and deletes).
    pub fn pending(&self) -> Result<usize> {
        Ok(self.writes.read()?.len())
    }

    /// Flush buffered writes to the parent.
    pub fn write(self) -> Result<()> {
        let writes = self.writes.into_inner()?;
        if writes.is_empty() {
            return Ok(());
        }
        let batch: WriteBatch = writes.into_iter().collect();
        tracing::trace!(entries = batch.len(), "flushing cache");
        self.parent.apply_batch(batch)
    }
}

impl KvStore for CacheKv<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.read()?.get(key) {
            return Ok(buffered.clone());
        }
        self.parent.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes
            .write()?
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.writes.write()?.insert(key.to_vec(), None);
        Ok(())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end)?.into_iter().collect();

        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        let writes = self.writes.read()?;
        for (key, value) in writes.range((Bound::Included(start.to_vec()), upper)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;

    #[test]
    fn test_discard_on_drop() {
        let kv = MemoryKv::new();
        {
            let cache = CacheKv::new(&kv);
            cache.set(b"k", b"v").unwrap();
            assert_eq!(cache.get(b"k").unwrap(), Some(b"v".to_vec()));
        }
        assert_eq!(kv.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_write_flushes() {
        let kv = MemoryKv::new();
        kv.set(b"old", b"1").unwrap();

        let cache = CacheKv::new(&kv);
        cache.set(b"new", b"2").unwrap();
        cache.delete(b"old").unwrap();
        assert_eq!(cache.get(b"old").unwrap(), None);
        assert_eq!(kv.get(b"old").unwrap(), Some(b"1".to_vec()));
        assert_eq!(cache.pending().unwrap(), 2);
        cache.write().unwrap();

        assert_eq!(kv.snapshot().unwrap(), vec![(b"new".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn test_range_overlays_parent() {
        let kv = MemoryKv::new();
        kv.set(b"a", b"parent").unwrap();
        kv.set(b"b", b"parent").unwrap();
        kv.set(b"c", b"parent").unwrap();

        let cache = CacheKv::new(&kv);
        cache.set(b"a", b"cache").unwrap();
        cache.delete(b"b").unwrap();
        cache.set(b"bb", b"cache").unwrap();

        let entries = cache.range(b"a", Some(b"c")).unwrap();
        assert_eq!(
            entries,
            vec![
                (b"a".to_vec(), b"cache".to_vec()),
                (b"bb".to_vec(), b"cache".to_vec()),
            ]
        );
    }

    #[test]
    fn test_nested_rollback() {
        let kv = MemoryKv::new();
        let outer = CacheKv::new(&kv);
        outer.set(b"outer", b"1").unwrap();
        {
            let inner = CacheKv::new(&outer);
            inner.set(b"inner", b"2").unwrap();
        }
        let committed = CacheKv::new(&outer);
        committed.set(b"kept", b"3").unwrap();
        committed.write().unwrap();
        outer.write().unwrap();

        assert!(kv.has(b"outer").unwrap());
        assert!(kv.has(b"kept").unwrap());
        assert!(!kv.has(b"inner").unwrap());
    }
}
