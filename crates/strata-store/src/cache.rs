// crates/strata-store/src/cache.rs
//
// Write-staging overlay.
//
// A `CacheStore` wraps a parent store and buffers every write. Reads consult
// the buffer first and fall through to the parent, so a transition sees its own
// staged changes. `commit` flushes the buffer to the parent as one batch;
// dropping the overlay without committing discards everything.

use std::collections::BTreeMap;

use strata_core::error::StrataError;
use strata_core::traits::{KvPair, KvStore};

/// Buffered view over a parent store.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    /// Staged writes: `Some` = set, `None` = delete.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of staged writes.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Flush all staged writes to the parent as a single batch.
    pub fn commit(self) -> Result<(), StrataError> {
        let count = self.writes.len();
        let writes = self.writes.into_iter().collect();
        self.parent.write_batch(writes)?;
        tracing::trace!("Committed {} staged writes", count);
        Ok(())
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StrataError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StrataError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StrataError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end)?.into_iter().collect();

        for (key, staged) in &self.writes {
            let in_range =
                key.as_slice() >= start && end.map_or(true, |end| key.as_slice() < end);
            if !in_range {
                continue;
            }
            match staged {
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
    use crate::memory::MemStore;

    #[test]
    fn test_reads_see_staged_writes() {
        let mut base = MemStore::new();
        base.set(b"a", b"1").unwrap();

        let mut cache = CacheStore::new(&mut base);
        cache.set(b"b", b"2").unwrap();
        cache.delete(b"a").unwrap();
        assert_eq!(cache.get(b"a").unwrap(), None);
        assert_eq!(cache.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(cache.pending(), 2);
    }

    #[test]
    fn test_drop_discards_writes() {
        let mut base = MemStore::new();
        base.set(b"a", b"1").unwrap();
        {
            let mut cache = CacheStore::new(&mut base);
            cache.set(b"a", b"changed").unwrap();
            cache.set(b"b", b"2").unwrap();
        }
        assert_eq!(base.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(base.get(b"b").unwrap(), None);
    }

    #[test]
    fn test_commit_flushes_writes() {
        let mut base = MemStore::new();
        base.set(b"a", b"1").unwrap();
        let mut cache = CacheStore::new(&mut base);
        cache.set(b"b", b"2").unwrap();
        cache.delete(b"a").unwrap();
        cache.commit().unwrap();

        assert_eq!(base.get(b"a").unwrap(), None);
        assert_eq!(base.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_range_merges_overlay() {
        let mut base = MemStore::new();
        base.set(&[1, 1], b"base").unwrap();
        base.set(&[1, 2], b"base").unwrap();
        base.set(&[2, 0], b"other").unwrap();

        let mut cache = CacheStore::new(&mut base);
        cache.delete(&[1, 1]).unwrap();
        cache.set(&[1, 3], b"staged").unwrap();
        cache.set(&[1, 2], b"updated").unwrap();

        let pairs = cache.prefix_scan(&[1]).unwrap();
        assert_eq!(
            pairs,
            vec![
                (vec![1, 2], b"updated".to_vec()),
                (vec![1, 3], b"staged".to_vec())
            ]
        );
    }

    #[test]
    fn test_nested_overlays() {
        let mut base = MemStore::new();
        let mut outer = CacheStore::new(&mut base);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set(b"k", b"v").unwrap();
            inner.commit().unwrap();
        }
        assert_eq!(outer.get(b"k").unwrap(), Some(b"v".to_vec()));
        outer.commit().unwrap();
        assert_eq!(base.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
