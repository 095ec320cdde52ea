//! Prefixed view over a parent store.

use crate::error::Result;
use crate::traits::{KvPair, KvStore, WriteBatch};

/// Smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when no such key exists (empty prefix or all `0xff`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// A view of `parent` in which every key is implicitly prefixed.
///
/// Keys handed to and returned from the view are relative to the prefix.
pub struct PrefixStore<'a> {
    parent: &'a dyn KvStore,
    prefix: Vec<u8>,
}

impl<'a> PrefixStore<'a> {
    pub fn new(parent: &'a dyn KvStore, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl KvStore for PrefixStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.parent.get(&self.full_key(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.parent.set(&self.full_key(key), value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.parent.delete(&self.full_key(key))
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>> {
        let start = self.full_key(start);
        let end = match end {
            Some(end) => Some(self.full_key(end)),
            None => prefix_end(&self.prefix),
        };
        let entries = self.parent.range(&start, end.as_deref())?;
        let strip = self.prefix.len();
        Ok(entries
            .into_iter()
            .map(|(k, v)| (k[strip..].to_vec(), v))
            .collect())
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        let batch = batch
            .into_iter()
            .map(|(k, v)| (self.full_key(&k), v))
            .collect();
        self.parent.apply_batch(batch)
    }
}
