//! Adapters for external concerns

mod api_keys;

pub use api_keys::{ApiKeyHashError, ApiKeyHasher, ApiKeyVerifier};
