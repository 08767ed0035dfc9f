// crates/strata-store/src/memory.rs
//
// Ordered in-memory key/value store.

use std::collections::BTreeMap;
use std::ops::Bound;

use strata_core::error::StrataError;
use strata_core::traits::{KvPair, KvStore};

/// `BTreeMap`-backed store. Iteration order is byte-lexicographic, matching
/// RocksDB's default comparator.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StrataError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StrataError> {
        self.entries.remove(key);
        Ok(())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StrataError> {
        let upper = match end {
            Some(end) if end <= start => return Ok(Vec::new()),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Ok(self
            .entries
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
