//! Authenticated cookie values
//!
//! A token is `base64url("<issued_at>|<sealed>|<mac>")` where `sealed` is the
//! AES-256-GCM output of [`encrypt_data`] and `mac` is HMAC-SHA256 over
//! `"<cookie name>|<issued_at>|<sealed>"`. The MAC is checked before anything else,
//! so a value minted for another cookie name never reaches decryption.

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::BridgeError;
use crate::utils::crypto::{
    decrypt_data, encrypt_data, generate_key, hmac_sha256, verify_hmac_sha256,
    ENCRYPTION_KEY_SIZE, HASH_KEY_SIZE,
};

/// Tolerated clock skew for tokens that claim to be issued in the future
const MAX_FUTURE_SKEW_SECONDS: i64 = 60;

/// Default lifetime of a token, independent of the cookie's own Max-Age
pub const DEFAULT_TOKEN_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Encoder/decoder bound to one cookie name and one key pair
pub struct CookieCodec {
    name: String,
    hash_key: [u8; HASH_KEY_SIZE],
    block_key: [u8; ENCRYPTION_KEY_SIZE],
    max_age: Duration,
}

impl CookieCodec {
    /// Build a codec from explicit keys
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        hash_key: [u8; HASH_KEY_SIZE],
        block_key: [u8; ENCRYPTION_KEY_SIZE],
        max_age_seconds: i64,
    ) -> Self {
        Self {
            name: name.into(),
            hash_key,
            block_key,
            max_age: Duration::seconds(max_age_seconds),
        }
    }

    /// Build a codec with fresh random keys
    ///
    /// Keys live as long as the codec. Dropping it invalidates every token it issued.
    #[must_use]
    pub fn generate(name: impl Into<String>, max_age_seconds: i64) -> Self {
        Self::new(name, generate_key(), generate_key(), max_age_seconds)
    }

    /// Cookie name this codec authenticates for
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialize, encrypt and authenticate `payload`
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encoding`] if serialization or encryption fails
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, BridgeError> {
        self.encode_at(payload, Utc::now().timestamp())
    }

    fn encode_at<T: Serialize>(&self, payload: &T, issued_at: i64) -> Result<String, BridgeError> {
        let sealed = encrypt_data(payload, &self.block_key)
            .map_err(|e| BridgeError::Encoding(e.to_string()))?;

        let mac = hmac_sha256(&self.hash_key, self.mac_input(issued_at, &sealed).as_bytes())
            .map_err(|e| BridgeError::Encoding(e.to_string()))?;
        let mac = general_purpose::URL_SAFE_NO_PAD.encode(mac);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(format!("{issued_at}|{sealed}|{mac}")))
    }

    /// Verify, check age, decrypt and deserialize a token
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Decoding`] if the token is malformed, tampered with,
    /// expired, or does not deserialize into `T`
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, BridgeError> {
        let raw = general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| BridgeError::Decoding("value is not base64url".to_string()))?;
        let raw = String::from_utf8(raw)
            .map_err(|_| BridgeError::Decoding("value is not valid UTF-8".to_string()))?;

        let mut parts = raw.splitn(3, '|');
        let (Some(issued_at), Some(sealed), Some(mac)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(BridgeError::Decoding("value has the wrong shape".to_string()));
        };

        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| BridgeError::Decoding("timestamp is not a number".to_string()))?;
        let mac = general_purpose::URL_SAFE_NO_PAD
            .decode(mac)
            .map_err(|_| BridgeError::Decoding("mac is not base64url".to_string()))?;

        if !verify_hmac_sha256(
            &self.hash_key,
            self.mac_input(issued_at, sealed).as_bytes(),
            &mac,
        ) {
            return Err(BridgeError::Decoding("mac mismatch".to_string()));
        }

        let now = Utc::now().timestamp();
        if issued_at > now + MAX_FUTURE_SKEW_SECONDS {
            return Err(BridgeError::Decoding("timestamp is in the future".to_string()));
        }
        if now - issued_at > self.max_age.num_seconds() {
            return Err(BridgeError::Decoding("value expired".to_string()));
        }

        decrypt_data(sealed, &self.block_key).map_err(|e| BridgeError::Decoding(e.to_string()))
    }

    fn mac_input(&self, issued_at: i64, sealed: &str) -> String {
        format!("{}|{issued_at}|{sealed}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CookiePayload;
    use std::collections::BTreeMap;

    fn codec() -> CookieCodec {
        CookieCodec::generate("clientMap", DEFAULT_TOKEN_MAX_AGE_SECONDS)
    }

    fn payload() -> CookiePayload {
        CookiePayload {
            username: "42".to_string(),
            sessionid: "abc".to_string(),
        }
    }

    #[test]
    fn test_encode_decode_session_payload() {
        let codec = codec();
        let token = codec.encode(&payload()).unwrap();
        let decoded: CookiePayload = codec.decode(&token).unwrap();
        assert_eq!(decoded, payload());
    }

    #[test]
    fn test_encode_decode_map_payload() {
        let codec = codec();
        let mut map = BTreeMap::new();
        map.insert("username".to_string(), "7".to_string());
        map.insert("sessionid".to_string(), "xyz".to_string());

        let token = codec.encode(&map).unwrap();
        let decoded: BTreeMap<String, String> = codec.decode(&token).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_every_bit_flip_is_rejected() {
        let codec = codec();
        let token = codec.encode(&payload()).unwrap();
        let bytes = token.as_bytes();

        for index in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[index] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                if tampered == token {
                    continue;
                }
                let result: Result<CookiePayload, _> = codec.decode(&tampered);
                // A flip in the unused low bits of the final base64 char can decode
                // to the same bytes; everything else must fail.
                if let Ok(decoded) = result {
                    assert_eq!(index, bytes.len() - 1);
                    assert_eq!(decoded, payload());
                }
            }
        }
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let token = codec().encode(&payload()).unwrap();
        let result: Result<CookiePayload, _> = codec().decode(&token);
        assert!(matches!(result, Err(BridgeError::Decoding(_))));
    }

    #[test]
    fn test_other_cookie_name_is_rejected() {
        let hash_key = generate_key();
        let block_key = generate_key();
        let issuing = CookieCodec::new("other", hash_key, block_key, 60);
        let checking = CookieCodec::new("clientMap", hash_key, block_key, 60);

        let token = issuing.encode(&payload()).unwrap();
        let result: Result<CookiePayload, _> = checking.decode(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = CookieCodec::generate("clientMap", 300);
        let issued_at = Utc::now().timestamp() - 301;
        let token = codec.encode_at(&payload(), issued_at).unwrap();

        let result: Result<CookiePayload, _> = codec.decode(&token);
        assert!(matches!(result, Err(BridgeError::Decoding(ref msg)) if msg.contains("expired")));
    }

    #[test]
    fn test_future_token_is_rejected() {
        let codec = codec();
        let issued_at = Utc::now().timestamp() + 3600;
        let token = codec.encode_at(&payload(), issued_at).unwrap();

        let result: Result<CookiePayload, _> = codec.decode(&token);
        assert!(matches!(result, Err(BridgeError::Decoding(ref msg)) if msg.contains("future")));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = codec();
        for input in ["", "not base64 !!", "YWJj", "MXx4eHx5eQ"] {
            let result: Result<CookiePayload, _> = codec.decode(input);
            assert!(result.is_err(), "{input} should not decode");
        }
    }
}
