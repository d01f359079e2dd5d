//! Admin API keys: Argon2id hashing and verification
//!
//! Configuration only ever holds PHC hash strings. Presented keys are checked
//! against every configured hash; Argon2's verifier compares in constant time.
//!
//! # Examples
//!
//! ```
//! use infrastructure::adapters::{ApiKeyHasher, ApiKeyVerifier};
//!
//! let hasher = ApiKeyHasher::new();
//! let hash = hasher.hash("sk-catalog-admin").unwrap();
//!
//! let verifier = ApiKeyVerifier::from_hashes([("ops", hash.as_str())]);
//! assert_eq!(verifier.verify("sk-catalog-admin"), Some("ops"));
//! assert_eq!(verifier.verify("wrong"), None);
//! ```

use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};
use password_hash::{SaltString, rand_core::OsRng};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ApiKeyEntry;

/// Errors that can occur during API key hashing operations
#[derive(Debug, Error)]
pub enum ApiKeyHashError {
    #[error("Failed to hash API key: {0}")]
    HashingFailed(String),

    #[error("Invalid hash format: {0}")]
    InvalidHashFormat(String),
}

/// Argon2id hasher with the crate's default parameters
/// (19 MiB memory, 2 iterations, parallelism 1)
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyHasher;

impl ApiKeyHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash a plaintext key into a PHC string suitable for `config.toml`
    #[instrument(skip_all)]
    pub fn hash(&self, api_key: &str) -> Result<String, ApiKeyHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(api_key.as_bytes(), &salt)
            .map_err(|e| ApiKeyHashError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a plaintext key against one PHC hash
    #[instrument(skip_all)]
    pub fn verify(&self, api_key: &str, hash: &str) -> Result<bool, ApiKeyHashError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApiKeyHashError::InvalidHashFormat(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(api_key.as_bytes(), &parsed)
            .is_ok())
    }

    /// Whether a string looks like an Argon2 PHC hash
    #[must_use]
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with("$argon2")
    }
}

#[derive(Debug, Clone)]
struct StoredKey {
    name: String,
    hash: String,
}

/// The set of admin keys the server accepts
#[derive(Debug, Clone, Default)]
pub struct ApiKeyVerifier {
    keys: Vec<StoredKey>,
    hasher: ApiKeyHasher,
}

impl ApiKeyVerifier {
    /// Build from configuration, skipping entries that are not Argon2 hashes
    pub fn from_config(entries: &[ApiKeyEntry]) -> Self {
        Self::from_hashes(entries.iter().map(|e| (e.name.as_str(), e.hash.as_str())))
    }

    /// Build from `(name, hash)` pairs
    pub fn from_hashes<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut keys = Vec::new();
        for (name, hash) in entries {
            if ApiKeyHasher::is_hashed(hash) {
                keys.push(StoredKey {
                    name: name.to_string(),
                    hash: hash.to_string(),
                });
            } else {
                warn!(
                    key_name = name,
                    "Ignoring plaintext API key; hash it with 'catalog-cli hash-api-key'"
                );
            }
        }
        debug!(count = keys.len(), "Admin API keys loaded");
        Self {
            keys,
            hasher: ApiKeyHasher::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Name of the key matching `api_key`, if any
    pub fn verify(&self, api_key: &str) -> Option<&str> {
        if api_key.is_empty() {
            return None;
        }
        self.keys
            .iter()
            .find(|key| {
                self.hasher
                    .verify(api_key, &key.hash)
                    .unwrap_or_else(|e| {
                        warn!(key_name = %key.name, error = %e, "Stored API key hash is malformed");
                        false
                    })
            })
            .map(|key| key.name.as_str())
    }
}
