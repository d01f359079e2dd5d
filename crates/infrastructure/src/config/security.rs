//! Security configuration: admin API keys and rate limiting.

use serde::{Deserialize, Serialize};

use super::default_true;

/// A hashed admin API key
///
/// Keys must be pre-hashed using Argon2id (PHC string format).
/// Use `catalog-cli hash-api-key` to produce a hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// Argon2id hash of the API key in PHC format
    /// Example: "$argon2id$v=19$m=19456,t=2,p=1$..."
    pub hash: String,

    /// Label of the key owner, used in logs only
    #[serde(default = "default_key_name")]
    pub name: String,
}

fn default_key_name() -> String {
    "admin".to_string()
}

/// Fixed-window rate limits per route group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window length in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// Requests per window for product listings
    #[serde(default = "default_list_max")]
    pub products_max: u32,

    /// Requests per window for single product reads
    #[serde(default = "default_detail_max")]
    pub product_max: u32,

    /// Requests per window for the category list
    #[serde(default = "default_list_max")]
    pub categories_max: u32,

    /// Requests per window for create/update/delete
    #[serde(default = "default_list_max")]
    pub admin_max: u32,

    /// Cleanup interval in seconds (default: 300 = 5 minutes)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Expired windows older than this many seconds are dropped (default: 600)
    #[serde(default = "default_cleanup_max_age")]
    pub cleanup_max_age_secs: u64,
}

const fn default_window() -> u64 {
    60
}

const fn default_list_max() -> u32 {
    100
}

const fn default_detail_max() -> u32 {
    200
}

const fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

const fn default_cleanup_max_age() -> u64 {
    600 // 10 minutes
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_window(),
            products_max: default_list_max(),
            product_max: default_detail_max(),
            categories_max: default_list_max(),
            admin_max: default_list_max(),
            cleanup_interval_secs: default_cleanup_interval(),
            cleanup_max_age_secs: default_cleanup_max_age(),
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Hashed admin API keys
    ///
    /// Example in config.toml:
    /// ```toml
    /// [[security.api_keys]]
    /// hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// name = "back-office"
    /// ```
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl SecurityConfig {
    /// Number of configured keys that are not Argon2 hashes
    #[must_use]
    pub fn count_plaintext_keys(&self) -> usize {
        self.api_keys
            .iter()
            .filter(|entry| !entry.hash.starts_with("$argon2"))
            .count()
    }

    /// Check if any admin API key is configured
    #[must_use]
    pub fn has_api_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }
}
