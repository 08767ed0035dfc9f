// crates/strata-core/src/traits.rs

use crate::error::StrataError;

/// A key/value pair returned by ordered scans.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A staged write: `Some(value)` sets the key, `None` deletes it.
pub type KvWrite = (Vec<u8>, Option<Vec<u8>>);

/// Keyed byte store with ordered iteration.
///
/// Implemented by strata-store (in-memory map, RocksDB, and the staging
/// overlay used to make each transition atomic).
pub trait KvStore {
    /// Retrieve the value under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StrataError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StrataError>;

    /// All pairs with `start <= key < end`, in ascending key order.
    /// `end = None` scans to the end of the keyspace.
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StrataError>;

    /// All pairs whose key begins with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<KvPair>, StrataError> {
        let end = prefix_end(prefix);
        self.range(prefix, end.as_deref())
    }

    /// Apply a batch of writes. Backends that can do so apply it atomically.
    fn write_batch(&mut self, writes: Vec<KvWrite>) -> Result<(), StrataError> {
        for (key, value) in writes {
            match value {
                Some(value) => self.set(&key, &value)?,
                None => self.delete(&key)?,
            }
        }
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool, StrataError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when the prefix is empty or all `0xff`.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(&[0x21]), Some(vec![0x22]));
        assert_eq!(prefix_end(&[0x21, 0xff]), Some(vec![0x22]));
        assert_eq!(prefix_end(&[0xff, 0xff]), None);
        assert_eq!(prefix_end(&[]), None);
    }
}
