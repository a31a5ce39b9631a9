//! AEAD sealing used by the encrypted system service.
//!
//! Values stored through `freyja-system` are wrapped in ChaCha20-Poly1305
//! ciphertext before they ever reach the log; to the storage engine they are
//! opaque bytes. The wire format is `nonce (12 bytes) || ciphertext+tag`.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum AeadError {
    #[error("ciphertext shorter than the {NONCE_LEN}-byte nonce prefix")]
    Truncated,
    #[error("AEAD seal/open failed (wrong key or tampered ciphertext)")]
    Reject,
}

/// A sealed value ready to be written as a KV record's value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue(Vec<u8>);

impl SealedValue {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Seals `plaintext` under `key` with a fresh random nonce.
///
/// `key` must be exactly 32 bytes (ChaCha20-Poly1305's key size).
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> SealedValue {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    // Only fails for payloads exceeding the cipher's internal length limit
    // (2^39-256 bytes), far beyond anything a single KV record can hold.
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .expect("chacha20poly1305 encryption does not fail for record-sized inputs");

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&ciphertext);
    SealedValue(out)
}

/// Opens a value previously produced by [`seal`] with the same key.
pub fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, AeadError> {
    if sealed.len() < NONCE_LEN {
        return Err(AeadError::Truncated);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher.decrypt(nonce, ciphertext).map_err(|_| AeadError::Reject)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] {
        [7u8; 32]
    }

    #[test]
    fn roundtrip() {
        let sealed = seal(&key(), b"top secret api key");
        let opened = open(&key(), sealed.as_bytes()).unwrap();
        assert_eq!(opened, b"top secret api key");
    }

    #[test]
    fn distinct_nonces_per_call() {
        let a = seal(&key(), b"same plaintext");
        let b = seal(&key(), b"same plaintext");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn wrong_key_rejected() {
        let sealed = seal(&key(), b"top secret");
        let wrong = [9u8; 32];
        assert!(open(&wrong, sealed.as_bytes()).is_err());
    }

    #[test]
    fn tampered_ciphertext_rejected() {
        let sealed = seal(&key(), b"top secret");
        let mut bytes = sealed.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(open(&key(), &bytes), Err(AeadError::Reject)));
    }

    #[test]
    fn truncated_ciphertext_rejected() {
        assert!(matches!(open(&key(), &[0u8; 4]), Err(AeadError::Truncated)));
    }
}
