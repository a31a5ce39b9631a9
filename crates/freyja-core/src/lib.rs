//! Bitcask-style, log-structured key-value storage engine.
//!
//! An active append-only file holds every record ever written; an
//! in-memory hash index maps each live key to its most recent offset. On
//! open, [`recovery::recover`] validates the file and truncates any trailing
//! torn write before the index is rebuilt by replaying the log.
//!
//! The composed entry point is [`store::KvStore`]. [`relationships`] layers
//! a directed-edge sub-index on top of it using a reserved key namespace;
//! [`diagnostics`] adds read-only Stats/Explain views.

pub mod diagnostics;
pub mod error;
pub mod index;
pub mod log_reader;
pub mod log_writer;
pub mod record;
pub mod recovery;
pub mod relationships;
pub mod store;

pub use diagnostics::{ExplainReport, ExplainSummary, RecordSample, SegmentInfo};
pub use error::{CorruptionKind, Error, Result};
pub use record::Record;
pub use recovery::RecoveryResult;
pub use relationships::{Direction, Relationship, RelationshipQuery, RelationshipResult};
pub use store::{Config, KvStore, StoreStats, RELATIONSHIP_KEY_PREFIX};
