// Cryptographic utilities for key material, random tokens and sealed payloads

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Authentication key size for HMAC-SHA256 (512 bits, one SHA-256 block)
pub const HASH_KEY_SIZE: usize = 64;

/// Fill a fixed-size key with bytes from the thread-local CSPRNG
#[must_use]
pub fn generate_key<const N: usize>() -> [u8; N] {
    let mut key = [0u8; N];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Generate a cryptographically secure random token of `length` bytes
///
/// # Returns
///
/// A base64url-encoded (unpadded) string of the random bytes
#[must_use]
pub fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Encrypt any serializable value with AES-256-GCM
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let json_data = serde_json::to_vec(data).context("Failed to serialize data")?;

    let nonce_bytes: [u8; NONCE_SIZE] = generate_key();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_slice())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Decrypt a value produced by [`encrypt_data`]
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    serde_json::from_slice(&plaintext).context("Failed to deserialize data from decrypted JSON")
}

/// Compute HMAC-SHA256 over `message`
///
/// # Errors
///
/// Returns an error if the key is rejected by the MAC implementation
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| anyhow!("Invalid HMAC key length: {e}"))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify an HMAC-SHA256 tag in constant time
#[must_use]
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    <HmacSha256 as Mac>::new_from_slice(key).is_ok_and(|mut mac| {
        mac.update(message);
        mac.verify_slice(tag).is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_generate_key_is_random() {
        let first: [u8; ENCRYPTION_KEY_SIZE] = generate_key();
        let second: [u8; ENCRYPTION_KEY_SIZE] = generate_key();
        assert_ne!(first, second);
    }

    #[test]
    fn test_generate_token_length() {
        // 16 bytes -> 22 base64url chars without padding
        assert_eq!(generate_token(16).len(), 22);
        assert_ne!(generate_token(16), generate_token(16));
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key: [u8; ENCRYPTION_KEY_SIZE] = generate_key();
        let mut payload = BTreeMap::new();
        payload.insert("username".to_string(), "42".to_string());

        let sealed = encrypt_data(&payload, &key).unwrap();
        let opened: BTreeMap<String, String> = decrypt_data(&sealed, &key).unwrap();

        assert_eq!(opened, payload);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let key: [u8; ENCRYPTION_KEY_SIZE] = generate_key();
        let other: [u8; ENCRYPTION_KEY_SIZE] = generate_key();

        let sealed = encrypt_data(&"secret", &key).unwrap();
        let result: Result<String> = decrypt_data(&sealed, &other);

        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        let result = encrypt_data(&"data", b"short");
        assert!(result.unwrap_err().to_string().contains("Invalid key length"));
    }

    #[test]
    fn test_decrypt_short_data_rejected() {
        let key: [u8; ENCRYPTION_KEY_SIZE] = generate_key();
        let result: Result<String> = decrypt_data("AAAA", &key);
        assert!(result.is_err());
    }

    #[test]
    fn test_hmac_sha256_verify() {
        let key: [u8; HASH_KEY_SIZE] = generate_key();
        let tag = hmac_sha256(&key, b"message").unwrap();

        assert_eq!(tag.len(), 32);
        assert!(verify_hmac_sha256(&key, b"message", &tag));
        assert!(!verify_hmac_sha256(&key, b"messagf", &tag));
    }
}
