//! Cryptographic primitives shared by the FreyjaDB storage engine and the
//! encrypted system service.
//!
//! This crate is deliberately small: a table-driven CRC32 used by the record
//! codec for on-disk integrity, and an AEAD seal/open pair used by
//! `freyja-system` to wrap values before they reach the log. Neither consumer
//! needs key management, rotation, or signing — those stay out of this crate.

pub mod aead;
pub mod crc32;

pub use aead::{AeadError, SealedValue};
pub use crc32::{crc32, Crc32};
