// crates/strata-store/src/rocks.rs
//
// RocksDB-backed persistent key/value store.
//
// Keys are the engine's raw byte keys; RocksDB's default bytewise comparator
// gives the same ordering as the in-memory store, so the time-keyed queues
// drain in the same order on every backend. Batches go through a single
// `WriteBatch`, which makes a committed transition atomic on disk.

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch};

use strata_core::error::StrataError;
use strata_core::traits::{KvPair, KvStore, KvWrite};

/// RocksDB wrapper implementing the `KvStore` trait.
#[derive(Debug)]
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, StrataError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            StrataError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        tracing::debug!("Opened RocksDB store at {}", path);
        Ok(Self { db })
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        self.db
            .get(key)
            .map_err(|e| StrataError::Storage(format!("RocksDB get failed: {}", e)))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StrataError> {
        self.db
            .put(key, value)
            .map_err(|e| StrataError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StrataError> {
        self.db
            .delete(key)
            .map_err(|e| StrataError::Storage(format!("RocksDB delete failed: {}", e)))
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StrataError> {
        let mut pairs = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(start, Direction::Forward));
        for item in iter {
            let (key, value) = item
                .map_err(|e| StrataError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Stop at the exclusive upper bound.
            if let Some(end) = end {
                if key.as_ref() >= end {
                    break;
                }
            }
            pairs.push((key.to_vec(), value.to_vec()));
        }

        Ok(pairs)
    }

    fn write_batch(&mut self, writes: Vec<KvWrite>) -> Result<(), StrataError> {
        let mut batch = WriteBatch::default();
        for (key, value) in &writes {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        self.db
            .write(batch)
            .map_err(|e| StrataError::Storage(format!("RocksDB batch write failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a temporary directory path using UUID to avoid conflicts.
    fn temp_db_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("strata_test_{}_{}", label, uuid::Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_put_get_delete() {
        let mut store = RocksStore::open(&temp_db_path("put_get")).unwrap();
        store.set(b"key", b"value").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
        store.delete(b"key").unwrap();
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn test_range_respects_bounds_and_order() {
        let mut store = RocksStore::open(&temp_db_path("range")).unwrap();
        store.set(&[0x42, 2], b"b").unwrap();
        store.set(&[0x42, 1], b"a").unwrap();
        store.set(&[0x43, 0], b"z").unwrap();

        let pairs = store.prefix_scan(&[0x42]).unwrap();
        assert_eq!(
            pairs,
            vec![
                (vec![0x42, 1], b"a".to_vec()),
                (vec![0x42, 2], b"b".to_vec())
            ]
        );
    }

    #[test]
    fn test_write_batch_applies_sets_and_deletes() {
        let mut store = RocksStore::open(&temp_db_path("batch")).unwrap();
        store.set(b"gone", b"1").unwrap();
        store
            .write_batch(vec![
                (b"new".to_vec(), Some(b"2".to_vec())),
                (b"gone".to_vec(), None),
            ])
            .unwrap();
        assert_eq!(store.get(b"new").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"gone").unwrap(), None);
    }
}
