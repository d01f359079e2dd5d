//! Product identifier value object
//!
//! New products get a time-ordered UUID v7. Lookups accept any non-empty
//! string; an identifier that was never issued simply finds nothing.
//!
//! # Examples
//!
//! ```
//! use domain::ProductId;
//!
//! let id = ProductId::new();
//! assert!(!id.as_str().is_empty());
//!
//! let parsed = ProductId::parse("legacy-42").unwrap();
//! assert_eq!(parsed.as_str(), "legacy-42");
//! assert!(ProductId::parse("  ").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// An opaque product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Accept an identifier supplied by a caller or read from storage
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.trim().is_empty() {
            return Err(DomainError::InvalidProductId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_id_is_unique() {
        let id1 = ProductId::new();
        let id2 = ProductId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_product_id_is_a_uuid() {
        let id = ProductId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn parse_accepts_opaque_strings() {
        let id = ProductId::parse("clx9abc").unwrap();
        assert_eq!(id.to_string(), "clx9abc");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(ProductId::parse("").is_err());
        assert!(ProductId::parse("   ").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ProductId::parse("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
