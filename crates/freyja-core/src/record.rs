//! Binary record codec.
//!
//! Each record is the atomic unit of the append-only log: a header
//! identifying the key/value lengths and write timestamp, the key bytes, the
//! value bytes, and a CRC32 computed over everything but itself.
//!
//! # Record Format
//!
//! ```text
//! [crc32:u32][key_size:u32][value_size:u32][timestamp:u64][key][value]
//!      4B          4B            4B            8B        ks      vs
//! total size: 20 + key_size + value_size
//! ```
//!
//! All integers are little-endian. An empty value denotes a tombstone:
//! the engine's way of recording "this key was deleted" without mutating
//! earlier bytes in the log.

use bytes::Bytes;
use freyja_crypto::crc32;

use crate::error::{CorruptionKind, Error};

/// Size of the fixed header: crc32(4) + key_size(4) + value_size(4) + timestamp(8).
pub const HEADER_SIZE: usize = 20;

/// A single decoded record from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub crc32: u32,
    pub timestamp: u64,
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    /// Total encoded size of this record, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len()
    }

    /// A tombstone is a record with no value.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }

    /// Encodes `(key, value)` with the given timestamp (nanoseconds since the
    /// Unix epoch) into a contiguous byte buffer, computing the CRC32 over
    /// bytes 4.. (everything after the checksum field itself).
    ///
    /// Fails if either length exceeds `u32::MAX`.
    pub fn encode(key: &[u8], value: &[u8], timestamp_ns: u64) -> Result<Bytes, Error> {
        let key_size = u32::try_from(key.len()).map_err(|_| {
            Error::RecordTooLarge {
                encoded: key.len(),
                max: u32::MAX as usize,
            }
        })?;
        let value_size = u32::try_from(value.len()).map_err(|_| {
            Error::RecordTooLarge {
                encoded: value.len(),
                max: u32::MAX as usize,
            }
        })?;

        let total = HEADER_SIZE + key.len() + value.len();
        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(&[0u8; 4]); // crc32 placeholder
        buf.extend_from_slice(&key_size.to_le_bytes());
        buf.extend_from_slice(&value_size.to_le_bytes());
        buf.extend_from_slice(&timestamp_ns.to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);

        let checksum = crc32(&buf[4..]);
        buf[0..4].copy_from_slice(&checksum.to_le_bytes());

        Ok(Bytes::from(buf))
    }

    /// Decodes a `Record` from `bytes`, which must contain at least one whole
    /// record starting at offset 0 (trailing bytes are ignored). Does not
    /// verify the CRC; call [`Record::validate`] separately.
    pub fn decode(bytes: &[u8]) -> Result<Record, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(CorruptionKind::ShortHeader { got: bytes.len() }.into());
        }

        let crc32 = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let key_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let value_size = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let timestamp = u64::from_le_bytes(bytes[12..20].try_into().unwrap());

        let need = HEADER_SIZE + key_size as usize + value_size as usize;
        if bytes.len() < need {
            return Err(CorruptionKind::ShortBody {
                got: bytes.len(),
                need,
            }
            .into());
        }

        let key_start = HEADER_SIZE;
        let key_end = key_start + key_size as usize;
        let value_end = key_end + value_size as usize;

        Ok(Record {
            crc32,
            timestamp,
            key: Bytes::copy_from_slice(&bytes[key_start..key_end]),
            value: Bytes::copy_from_slice(&bytes[key_end..value_end]),
        })
    }

    /// Recomputes the CRC32 over this record's fields and compares it to the
    /// stored checksum.
    pub fn validate(&self) -> Result<(), Error> {
        let key_size = self.key.len() as u32;
        let value_size = self.value.len() as u32;

        let mut span = Vec::with_capacity(16 + self.key.len() + self.value.len());
        span.extend_from_slice(&key_size.to_le_bytes());
        span.extend_from_slice(&value_size.to_le_bytes());
        span.extend_from_slice(&self.timestamp.to_le_bytes());
        span.extend_from_slice(&self.key);
        span.extend_from_slice(&self.value);

        let computed = crc32(&span);
        if computed != self.crc32 {
            return Err(CorruptionKind::CrcMismatch {
                stored: self.crc32,
                computed,
            }
            .into());
        }
        Ok(())
    }
}
