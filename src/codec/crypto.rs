//! Authenticated encryption for tracking tokens.
//!
//! Sealed layout: `version (1) || nonce (12) || ciphertext || tag (16)`,
//! using AES-256-GCM with a fresh random nonce per token. The 256-bit key is
//! the SHA-256 digest of whatever secret the operator configured.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::{DecodeError, EncodeError};

/// Leading byte of every sealed token. Plain tokens start with `{`.
pub const SEALED_VERSION: u8 = 0x01;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric key used to seal and open tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Derives a key from an arbitrary secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(secret.as_ref()).into())
    }

    /// Fresh random secret, base64url encoded, suitable for `TRACKING_ENCRYPTION_KEY`.
    pub fn generate_secret() -> String {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        URL_SAFE_NO_PAD.encode(key)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Encrypts `plaintext` into the sealed layout.
pub fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = key
        .cipher()
        .encrypt(&nonce, plaintext)
        .map_err(|_| EncodeError::Encryption)?;

    let mut sealed = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    sealed.push(SEALED_VERSION);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts and authenticates a sealed token.
///
/// Every failure maps to the same `decryption_failed` error so callers
/// cannot tell a foreign key from a corrupted token.
pub fn open(key: &EncryptionKey, sealed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let well_formed = sealed.len() >= 1 + NONCE_LEN + TAG_LEN && sealed[0] == SEALED_VERSION;

    // The AEAD check runs for every input; short tokens get a zero nonce.
    let body = sealed.get(1..).unwrap_or_default();
    let (nonce, ciphertext) = if body.len() >= NONCE_LEN {
        body.split_at(NONCE_LEN)
    } else {
        (&[0u8; NONCE_LEN][..], body)
    };
    let opened = key.cipher().decrypt(Nonce::from_slice(nonce), ciphertext);

    match opened {
        Ok(plaintext) if well_formed => Ok(plaintext),
        _ => Err(DecodeError::decryption_failed()),
    }
}
