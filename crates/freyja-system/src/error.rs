//! Error type for the encrypted system-config store.

use thiserror::Error;

/// Errors returned by [`crate::SystemStore`].
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated unchanged from the underlying `freyja-core` store.
    #[error(transparent)]
    Core(#[from] freyja_core::Error),

    /// AEAD seal/open failed: wrong key, truncated ciphertext, or tampering.
    #[error("crypto error: {0}")]
    Crypto(#[from] freyja_crypto::AeadError),
}

pub type Result<T> = std::result::Result<T, Error>;
