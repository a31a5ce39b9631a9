//! In-memory hash index mapping keys to their latest on-disk location.
//!
//! The index is the engine's map from key to `(offset, size, timestamp)`.
//! Tombstones are represented by the *absence* of a key, not by a dedicated
//! entry — deleting a key removes it from the map entirely.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Error;
use crate::log_reader::LogReader;

/// A pointer to a live record on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Currently always 0; reserved for a future multi-file layout.
    pub file_id: u32,
    /// Byte offset of the record header in the active file.
    pub offset: u64,
    /// Total encoded size of the record, header included.
    pub size: u64,
    /// The record's write timestamp (nanoseconds since the Unix epoch).
    pub timestamp: u64,
}

/// Summary statistics over the index's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub key_count: usize,
    /// Rough estimate: `key_count * (avg key len + size of IndexEntry)`.
    pub approx_bytes: usize,
}

/// Concurrent, key-addressable map from key bytes to [`IndexEntry`].
///
/// Reads (`get`, enumeration) may run concurrently with each other; any
/// mutation takes the write side of the lock. Prefix scans snapshot their key
/// set under the read lock so an in-flight scan cannot observe a torn map.
#[derive(Debug, Default)]
pub struct HashIndex {
    map: RwLock<HashMap<Vec<u8>, IndexEntry>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, key: &[u8], entry: IndexEntry) {
        self.map
            .write()
            .expect("hash index poisoned")
            .insert(key.to_vec(), entry);
    }

    pub fn get(&self, key: &[u8]) -> Option<IndexEntry> {
        self.map.read().expect("hash index poisoned").get(key).copied()
    }

    pub fn delete(&self, key: &[u8]) -> Option<IndexEntry> {
        self.map.write().expect("hash index poisoned").remove(key)
    }

    pub fn size(&self) -> usize {
        self.map.read().expect("hash index poisoned").len()
    }

    pub fn clear(&self) {
        self.map.write().expect("hash index poisoned").clear();
    }

    /// All keys currently in the index. Unspecified order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.map.read().expect("hash index poisoned").keys().cloned().collect()
    }

    /// Keys beginning with `prefix`. An empty prefix matches every key.
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.map
            .read()
            .expect("hash index poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// A lazy sequence of `(key, entry)` pairs whose key begins with
    /// `prefix`, snapshotted at call time under the read lock.
    pub fn scan_prefix(&self, prefix: &[u8]) -> ScanPrefixIter {
        let snapshot: Vec<(Vec<u8>, IndexEntry)> = self
            .map
            .read()
            .expect("hash index poisoned")
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        ScanPrefixIter {
            inner: snapshot.into_iter(),
        }
    }

    pub fn stats(&self) -> IndexStats {
        let map = self.map.read().expect("hash index poisoned");
        let key_count = map.len();
        let approx_bytes = map
            .keys()
            .map(|k| k.len() + std::mem::size_of::<IndexEntry>())
            .sum();
        IndexStats {
            key_count,
            approx_bytes,
        }
    }

    /// Rebuilds the index from scratch by replaying `reader` from offset 0.
    ///
    /// For each record: inserts `key -> entry` when the value is non-empty,
    /// or removes the key when the value is empty (a tombstone). Stops at the
    /// first reader error, propagating a corruption error to the caller.
    pub fn build_from_log(&self, reader: &mut LogReader) -> Result<(), Error> {
        self.clear();
        reader.seek(0)?;

        loop {
            let start = reader.position();
            match reader.read_next()? {
                None => break,
                Some(record) => {
                    let end = reader.position();
                    let size = end - start;
                    if record.is_tombstone() {
                        self.delete(&record.key);
                    } else {
                        self.put(
                            &record.key,
                            IndexEntry {
                                file_id: 0,
                                offset: start,
                                size,
                                timestamp: record.timestamp,
                            },
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Iterator returned by [`HashIndex::scan_prefix`].
pub struct ScanPrefixIter {
    inner: std::vec::IntoIter<(Vec<u8>, IndexEntry)>,
}

impl Iterator for ScanPrefixIter {
    type Item = (Vec<u8>, IndexEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: u64) -> IndexEntry {
        IndexEntry {
            file_id: 0,
            offset,
            size: 10,
            timestamp: 0,
        }
    }

    #[test]
    fn put_get_delete() {
        let idx = HashIndex::new();
        idx.put(b"a", entry(0));
        assert_eq!(idx.get(b"a"), Some(entry(0)));
        idx.delete(b"a");
        assert_eq!(idx.get(b"a"), None);
    }

    #[test]
    fn prefix_matching() {
        let idx = HashIndex::new();
        idx.put(b"user:1", entry(0));
        idx.put(b"user:2", entry(1));
        idx.put(b"place:1", entry(2));

        let mut users = idx.keys_with_prefix(b"user:");
        users.sort();
        assert_eq!(users, vec![b"user:1".to_vec(), b"user:2".to_vec()]);

        assert_eq!(idx.keys_with_prefix(b"").len(), 3);
    }

    #[test]
    fn scan_prefix_snapshots() {
        let idx = HashIndex::new();
        idx.put(b"a:1", entry(0));
        let scan = idx.scan_prefix(b"a:");
        idx.put(b"a:2", entry(1)); // inserted after the snapshot
        let results: Vec<_> = scan.collect();
        assert_eq!(results.len(), 1);
    }
}
