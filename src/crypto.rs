//! Cryptography module for note content encryption
//!
//! Provides AES-256-GCM encryption of a note body under a key derived
//! from a user-supplied password. No key is ever stored and there is no
//! password recovery: losing the password loses the note.
//!
//! The key is a plain SHA-256 digest of the password. This is a
//! compatibility contract with existing encrypted blobs (same password,
//! same key, round-trip works), not a hardened KDF; swapping in a slow
//! derivation would require a new blob format version.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

const NONCE_SIZE: usize = 12; // 96 bits for GCM

/// Encrypt a note body with AES-256-GCM.
///
/// A fresh random nonce is generated on every call, so encrypting the
/// same plaintext under the same password twice yields different blobs.
/// The result is `base64(nonce || ciphertext-with-auth-tag)`, a single
/// printable string suitable for storing in the note's content field.
pub fn encrypt(plaintext: &str, password: &str) -> Result<String> {
    let key = derive_key(password);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AppError::Crypto(format!("Cipher initialization failed: {}", e)))?;

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| AppError::Crypto(format!("Encryption failed: {}", e)))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(blob))
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Every failure mode (undecodable blob, truncated data, auth-tag
/// mismatch, non-UTF-8 plaintext) collapses into [`AppError::Decryption`]:
/// the system cannot distinguish "wrong password" from "corrupted
/// ciphertext" and must not pretend otherwise.
pub fn decrypt(blob: &str, password: &str) -> Result<String> {
    let bytes = BASE64.decode(blob).map_err(|_| AppError::Decryption)?;

    if bytes.len() <= NONCE_SIZE {
        return Err(AppError::Decryption);
    }
    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let key = derive_key(password);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AppError::Crypto(format!("Cipher initialization failed: {}", e)))?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| AppError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| AppError::Decryption)
}

/// Derive the 256-bit AES key as SHA-256(password).
fn derive_key(password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
