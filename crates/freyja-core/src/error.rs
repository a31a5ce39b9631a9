//! Error taxonomy for the storage engine.
//!
//! Every public operation on [`crate::store::KvStore`] and its collaborators
//! returns this single [`Error`] type. Read-path errors other than
//! [`Error::KeyNotFound`] propagate to the caller unmodified; write-path
//! errors that managed to append partial bytes are cleaned up by
//! [`crate::recovery`] on the next open.

use std::path::PathBuf;

/// The error type returned by every public `freyja-core` operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `Get` found no live value for the requested key (absent or tombstoned).
    #[error("key not found")]
    KeyNotFound,

    /// `Put`/`Delete` was called with an empty key.
    #[error("invalid key: key must not be empty")]
    InvalidKey,

    /// The encoded record would exceed the configured `max_record_size`.
    #[error("record too large: encoded size {encoded} exceeds max_record_size {max}")]
    RecordTooLarge { encoded: usize, max: usize },

    /// CRC mismatch, short header, or impossible sizes found while decoding
    /// or validating a record.
    #[error("corruption detected: {0}")]
    Corruption(#[from] CorruptionKind),

    /// Any underlying filesystem error not covered by the other variants.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An operation was attempted on a closed or never-opened store.
    #[error("store not open")]
    NotOpen,
}

/// The specific way a record or log region was found to be corrupt.
#[derive(Debug, thiserror::Error)]
pub enum CorruptionKind {
    #[error("short header: got {got} bytes, need at least 20")]
    ShortHeader { got: usize },

    #[error("short body: got {got} bytes, need {need}")]
    ShortBody { got: usize, need: usize },

    #[error("crc mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch { stored: u32, computed: u32 },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
