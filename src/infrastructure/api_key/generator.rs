//! API Key generation
//!
//! Generates API keys from OS randomness. Only the SHA-256 digest of a key
//! is ever stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const HASH_SCHEME: &str = "sha256$";
const DISPLAY_PREFIX_CHARS: usize = 8;

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key (only shown once at creation)
    pub key: String,
    /// Type prefix plus the first random characters, safe to display
    pub prefix: String,
    /// Digest stored in place of the key
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
    key_bytes: usize,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_bytes: 32,
        }
    }

    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = vec![0u8; self.key_bytes];
        OsRng.fill_bytes(&mut random_bytes);

        self.from_secret(&URL_SAFE_NO_PAD.encode(&random_bytes))
    }

    /// Build a key around a known random portion (deterministic keys for tests)
    pub fn from_secret(&self, secret: &str) -> GeneratedApiKey {
        let key = format!("{}{}", self.prefix, secret);
        let visible: String = secret.chars().take(DISPLAY_PREFIX_CHARS).collect();

        GeneratedApiKey {
            prefix: format!("{}{}", self.prefix, visible),
            hash: hash_key(&key),
            key,
        }
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new("gk_")
    }
}

/// Digest of a presented key, in the form stored by the repository
pub fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}{}", HASH_SCHEME, hex::encode(digest))
}

pub fn verify_key(key: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_key(key), stored_hash)
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
