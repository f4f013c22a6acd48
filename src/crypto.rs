//! Token decryption module using AES-256-GCM
//!
//! Config entries carry their access tokens as base64-encoded ciphertext
//! strings produced under a shared symmetric key. The wire format is a
//! version byte, a random 12-byte nonce, then ciphertext plus tag, all
//! base64-encoded. The matching `encrypt_token` helper exists so operators
//! and tests can author entries; the synchronizer itself only decrypts.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("payload is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Secure wrapper for the symmetric key with zeroization
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for the run key
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from raw bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Decode a base64 key as carried in a secret entry's secret value
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        Self::new(bytes)
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(key: &CryptoKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // Prepend version byte and nonce to ciphertext
    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
///
/// A payload without the version marker is rejected outright: whether tokens
/// are ciphertext at all is decided up front for the whole run, so there is
/// no plaintext passthrough here.
pub fn decrypt_bytes(key: &CryptoKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    if ciphertext[0] != VERSION_ENCRYPTED {
        return Err(CryptoError::InvalidFormat);
    }

    // Minimum length covers version + nonce + tag
    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let tag_and_ct = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(nonce, tag_and_ct)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Encrypt a token string, producing the base64 form stored in config entries
pub fn encrypt_token(key: &CryptoKey, plaintext: &str) -> Result<String, CryptoError> {
    Ok(BASE64.encode(encrypt_bytes(key, plaintext.as_bytes())?))
}

/// Decrypt a base64 token ciphertext back to its plaintext string
pub fn decrypt_token(key: &CryptoKey, ciphertext: &str) -> Result<String, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    let raw = BASE64
        .decode(ciphertext)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

    let plaintext = decrypt_bytes(key, &raw)?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("invalid UTF-8: {}", e)))
}
