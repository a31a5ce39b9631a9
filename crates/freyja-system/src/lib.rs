//! The encrypted "system service": a thin consumer of `freyja-core` that
//! wraps values in AEAD ciphertext before they ever reach the log.
//!
//! `SystemStore` exists to demonstrate that the core engine is agnostic
//! about value encoding — it stores opaque bytes under an ordinary key. It
//! is deliberately small: it does not implement API-key lifecycle
//! management, rotation, or a "system config" schema of its own.
//!
//! On-disk layout: `<data_dir>/system/active.data`, the same record format
//! `freyja-core` uses everywhere else. Values are `nonce (12 bytes) ||
//! ciphertext+tag`.

use std::path::Path;
use std::time::Duration;

use freyja_core::{Config, KvStore, RecoveryResult};
use freyja_crypto::aead;

mod error;
pub use error::{Error, Result};

/// A key-value store whose values are transparently sealed with
/// ChaCha20-Poly1305 before they reach the underlying log.
pub struct SystemStore {
    inner: KvStore,
    key: [u8; 32],
}

impl SystemStore {
    /// Opens (creating if necessary) the system store rooted at
    /// `<data_dir>/system`. `key` is the 32-byte AEAD key used to seal and
    /// open every value; callers are responsible for its lifecycle (the
    /// default CLI wiring reads it from `system.key_path`).
    pub fn open(data_dir: impl AsRef<Path>, key: [u8; 32]) -> Result<(Self, RecoveryResult)> {
        let system_dir = data_dir.as_ref().join("system");
        let config = Config::new(system_dir);
        let (inner, recovery) = KvStore::open(config)?;
        Ok((SystemStore { inner, key }, recovery))
    }

    /// Opens with an explicit fsync interval, for callers that want batched
    /// durability instead of the per-write default.
    pub fn open_with_fsync_interval(
        data_dir: impl AsRef<Path>,
        key: [u8; 32],
        fsync_interval: Duration,
    ) -> Result<(Self, RecoveryResult)> {
        let system_dir = data_dir.as_ref().join("system");
        let mut config = Config::new(system_dir);
        config.fsync_interval = fsync_interval;
        let (inner, recovery) = KvStore::open(config)?;
        Ok((SystemStore { inner, key }, recovery))
    }

    /// Seals `plaintext` under this store's key with a fresh random nonce
    /// and writes it under `key`, replacing any prior secret.
    pub fn put_secret(&self, key: &[u8], plaintext: &[u8]) -> Result<()> {
        let sealed = aead::seal(&self.key, plaintext);
        self.inner.put(key, sealed.as_bytes())?;
        Ok(())
    }

    /// Reads the secret stored under `key`, opening its AEAD ciphertext.
    pub fn get_secret(&self, key: &[u8]) -> Result<Vec<u8>> {
        let sealed = self.inner.get(key)?;
        let plaintext = aead::open(&self.key, &sealed)?;
        Ok(plaintext)
    }

    /// Removes the secret stored under `key`, idempotently.
    pub fn delete_secret(&self, key: &[u8]) -> Result<()> {
        self.inner.delete(key)?;
        Ok(())
    }

    /// Lists every secret key beginning with `prefix`.
    pub fn list_secrets(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self.inner.list_keys(prefix)?)
    }

    /// Flushes and closes the underlying store.
    pub fn close(&self) -> Result<()> {
        self.inner.close()?;
        Ok(())
    }
}
