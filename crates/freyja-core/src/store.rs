//! The composed key-value store: crash recovery, log writer, log reader, and
//! hash index wired together behind a single exclusive lock.
//!
//! `KvStore` is intentionally coarse-grained about concurrency. All public
//! operations serialize on one mutex — simpler to reason about than
//! fine-grained locking, and sufficient for the single-process embedded
//! model this engine targets. See [`crate::index::HashIndex`] for the one
//! place finer-grained locking is still useful (concurrent `get` alongside
//! a prefix scan).

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Error;
use crate::index::{HashIndex, IndexEntry};
use crate::log_reader::LogReader;
use crate::log_writer::{LogWriter, DEFAULT_BUFFER_SIZE};
use crate::recovery::{self, RecoveryResult};

/// Prefix reserved for the relationship sub-index; external callers may not
/// write keys beginning with this literal.
pub const RELATIONSHIP_KEY_PREFIX: &str = "relationship:";

/// Configuration consumed when opening a [`KvStore`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the active file, created (mode 0750) if missing.
    pub data_dir: PathBuf,
    /// Interval between periodic fsyncs. Zero means fsync on every `put`.
    pub fsync_interval: Duration,
    /// Maximum total encoded record size, header included. Puts that would
    /// exceed this fail with [`Error::RecordTooLarge`].
    pub max_record_size: usize,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            fsync_interval: Duration::ZERO,
            max_record_size: 64 * 1024 * 1024,
        }
    }
}

/// Point-in-time counts returned by [`KvStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub key_count: usize,
    pub log_size_bytes: u64,
}

pub(crate) struct OpenState {
    writer: LogWriter,
    reader: LogReader,
}

/// A single-file, log-structured key-value store.
///
/// Owns one log writer, one log reader (reused for positional reads), one
/// hash index, and its configuration. `get`/`put`/`delete`/`scan_prefix`
/// all acquire the same exclusive lock; see module docs.
pub struct KvStore {
    config: Config,
    active_path: PathBuf,
    index: HashIndex,
    state: Mutex<Option<OpenState>>,
}

impl KvStore {
    /// Opens (creating if necessary) the store rooted at `config.data_dir`.
    ///
    /// Runs crash recovery against `<data_dir>/active.data`, opens the
    /// writer and reader, and replays the validated log into the hash
    /// index. Returns the [`RecoveryResult`] alongside the opened store so
    /// callers can log or report it.
    pub fn open(config: Config) -> Result<(Self, RecoveryResult), Error> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| Error::io(&config.data_dir, e))?;
        let active_path = config.data_dir.join("active.data");

        let recovery_result = recovery::recover(&active_path)?;

        let writer = LogWriter::open(&active_path, DEFAULT_BUFFER_SIZE, config.fsync_interval)?;
        let mut reader = LogReader::open(&active_path, 0)?;

        let index = HashIndex::new();
        index.build_from_log(&mut reader)?;

        let store = KvStore {
            config,
            active_path,
            index,
            state: Mutex::new(Some(OpenState { writer, reader })),
        };

        Ok((store, recovery_result))
    }

    /// Path of the active log file backing this store.
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn validate_key(key: &[u8]) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }
        Ok(())
    }

    /// Keys accepted from external callers (the CLI, the REST facade):
    /// rejects empty keys and anything under the reserved relationship
    /// namespace, which only [`crate::relationships`] may write.
    fn validate_external_key(key: &[u8]) -> Result<(), Error> {
        Self::validate_key(key)?;
        if key.starts_with(RELATIONSHIP_KEY_PREFIX.as_bytes()) {
            return Err(Error::InvalidKey);
        }
        Ok(())
    }

    /// Returns the value stored at `key`, or [`Error::KeyNotFound`] if the
    /// key is absent or tombstoned.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, Error> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let state = guard.as_ref().ok_or(Error::NotOpen)?;

        let entry = self.index.get(key).ok_or(Error::KeyNotFound)?;
        let record = state.reader.read_at(entry.offset)?;
        debug_assert_eq!(&record.key[..], key, "index offset did not point at requested key");
        if record.is_tombstone() {
            return Err(Error::KeyNotFound);
        }
        Ok(record.value.to_vec())
    }

    /// Writes `value` under `key`, replacing any prior value.
    ///
    /// Rejects keys under the reserved relationship namespace; use
    /// [`KvStore::put_relationship`] to write those.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        Self::validate_external_key(key)?;
        self.put_raw(key, value)
    }

    /// Writes `value` under `key` without the reserved-namespace check,
    /// for internal callers (the relationship sub-index) that legitimately
    /// write under [`RELATIONSHIP_KEY_PREFIX`].
    pub(crate) fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        Self::validate_key(key)?;
        let encoded_len = crate::record::HEADER_SIZE + key.len() + value.len();
        if encoded_len > self.config.max_record_size {
            return Err(Error::RecordTooLarge {
                encoded: encoded_len,
                max: self.config.max_record_size,
            });
        }

        let mut guard = self.state.lock().expect("store mutex poisoned");
        let state = guard.as_mut().ok_or(Error::NotOpen)?;

        let offset = state.writer.put(key, value)?;
        self.index.put(
            key,
            IndexEntry {
                file_id: 0,
                offset,
                size: encoded_len as u64,
                timestamp: now_ns(),
            },
        );
        Ok(())
    }

    /// Appends a tombstone for `key` and removes it from the index.
    /// Idempotent: deleting an absent key still appends a tombstone.
    ///
    /// Rejects keys under the reserved relationship namespace; use
    /// [`KvStore::delete_relationship`] to remove those.
    pub fn delete(&self, key: &[u8]) -> Result<(), Error> {
        Self::validate_external_key(key)?;
        self.delete_raw(key)
    }

    /// Deletes `key` without the reserved-namespace check, for internal
    /// callers (the relationship sub-index).
    pub(crate) fn delete_raw(&self, key: &[u8]) -> Result<(), Error> {
        Self::validate_key(key)?;

        let mut guard = self.state.lock().expect("store mutex poisoned");
        let state = guard.as_mut().ok_or(Error::NotOpen)?;

        state.writer.put(key, b"")?;
        self.index.delete(key);
        Ok(())
    }

    /// Snapshot of every key beginning with `prefix` (an empty prefix
    /// matches every key).
    pub fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let guard = self.state.lock().expect("store mutex poisoned");
        guard.as_ref().ok_or(Error::NotOpen)?;
        Ok(self.index.keys_with_prefix(prefix))
    }

    /// Reads every prefix-matching `(key, value)` pair present at snapshot
    /// time. Records that fail to read or were tombstoned in the meantime
    /// are skipped silently, preserving liveness of the scan.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let state = guard.as_ref().ok_or(Error::NotOpen)?;

        let mut out = Vec::new();
        for (key, entry) in self.index.scan_prefix(prefix) {
            match state.reader.read_at(entry.offset) {
                Ok(record) if !record.is_tombstone() => out.push((key, record.value.to_vec())),
                _ => continue,
            }
        }
        Ok(out)
    }

    /// Live key count and current log size.
    pub fn stats(&self) -> Result<StoreStats, Error> {
        let guard = self.state.lock().expect("store mutex poisoned");
        let state = guard.as_ref().ok_or(Error::NotOpen)?;
        Ok(StoreStats {
            key_count: self.index.size(),
            log_size_bytes: state.writer.size(),
        })
    }

    /// A snapshot of the index's internal size accounting, used by
    /// diagnostics without requiring a second lock acquisition pattern.
    pub(crate) fn index(&self) -> &HashIndex {
        &self.index
    }

    /// Locks and returns the open/closed state, for callers outside this
    /// module (namely [`crate::diagnostics`]) that need to serialize a
    /// multi-step read against concurrent `put`/`delete`/`close`.
    pub(crate) fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<OpenState>> {
        self.state.lock().expect("store mutex poisoned")
    }

    /// Flushes and closes the writer, then drops the reader. Idempotent:
    /// calling `close` on an already-closed store is a no-op.
    pub fn close(&self) -> Result<(), Error> {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        if let Some(mut state) = guard.take() {
            state.writer.close()?;
        }
        Ok(())
    }

    /// Whether the store has not yet been closed.
    pub fn is_open(&self) -> bool {
        self.state.lock().expect("store mutex poisoned").is_some()
    }
}

fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> KvStore {
        let (store, _) = KvStore::open(Config::new(dir)).unwrap();
        store
    }

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), b"1");
    }

    #[test]
    fn put_then_get_roundtrips_under_batched_fsync() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.fsync_interval = Duration::from_secs(60);
        let (store, _) = KvStore::open(config).unwrap();

        store.put(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), b"1");
    }

    #[test]
    fn put_rejects_reserved_relationship_prefix() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let reserved = format!("{RELATIONSHIP_KEY_PREFIX}forward:alice:follows:bob");
        assert!(matches!(
            store.put(reserved.as_bytes(), b"forged"),
            Err(Error::InvalidKey)
        ));
        assert!(matches!(
            store.delete(reserved.as_bytes()),
            Err(Error::InvalidKey)
        ));
    }

    #[test]
    fn get_missing_key_fails() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(matches!(store.get(b"nope"), Err(Error::KeyNotFound)));
    }

    #[test]
    fn delete_then_get_fails() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"a", b"1").unwrap();
        store.delete(b"a").unwrap();
        assert!(matches!(store.get(b"a"), Err(Error::KeyNotFound)));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.delete(b"never-existed").unwrap();
        store.delete(b"never-existed").unwrap();
    }

    #[test]
    fn empty_key_rejected() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(matches!(store.put(b"", b"v"), Err(Error::InvalidKey)));
        assert!(matches!(store.delete(b""), Err(Error::InvalidKey)));
    }

    #[test]
    fn record_too_large_rejected() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.max_record_size = 30;
        let (store, _) = KvStore::open(config).unwrap();
        let big_value = vec![0u8; 100];
        assert!(matches!(
            store.put(b"k", &big_value),
            Err(Error::RecordTooLarge { .. })
        ));
    }

    #[test]
    fn list_keys_and_scan_prefix() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"user:1", b"alice").unwrap();
        store.put(b"user:2", b"bob").unwrap();
        store.put(b"place:1", b"oslo").unwrap();

        let mut keys = store.list_keys(b"user:").unwrap();
        keys.sort();
        assert_eq!(keys, vec![b"user:1".to_vec(), b"user:2".to_vec()]);

        let mut scanned = store.scan_prefix(b"user:").unwrap();
        scanned.sort();
        assert_eq!(
            scanned,
            vec![
                (b"user:1".to_vec(), b"alice".to_vec()),
                (b"user:2".to_vec(), b"bob".to_vec()),
            ]
        );
    }

    #[test]
    fn scan_prefix_skips_tombstones() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"a:1", b"x").unwrap();
        store.put(b"a:2", b"y").unwrap();
        store.delete(b"a:2").unwrap();

        let scanned = store.scan_prefix(b"a:").unwrap();
        assert_eq!(scanned, vec![(b"a:1".to_vec(), b"x".to_vec())]);
    }

    #[test]
    fn stats_reports_live_key_count() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();
        store.delete(b"a").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.key_count, 1);
        assert!(stats.log_size_bytes > 0);
    }

    #[test]
    fn close_then_operations_fail_not_open() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"a", b"1").unwrap();
        store.close().unwrap();
        assert!(matches!(store.get(b"a"), Err(Error::NotOpen)));
        assert!(matches!(store.put(b"a", b"2"), Err(Error::NotOpen)));
        assert!(!store.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.close().unwrap();
        store.close().unwrap();
    }

    #[test]
    fn reopen_replays_log_into_index() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.put(b"a", b"1").unwrap();
            store.put(b"b", b"2").unwrap();
            store.delete(b"a").unwrap();
            store.close().unwrap();
        }

        let (store, recovery_result) = KvStore::open(Config::new(dir.path())).unwrap();
        assert_eq!(recovery_result.records_truncated, 0);
        assert_eq!(store.get(b"b").unwrap(), b"2");
        assert!(matches!(store.get(b"a"), Err(Error::KeyNotFound)));
    }
}
