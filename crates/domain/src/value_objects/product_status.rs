//! Product status value object
//!
//! Drafts are visible to administrators only; active products are public.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Publication state of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Work in progress, hidden from the public
    #[default]
    Draft,
    /// Published
    Active,
}

impl ProductStatus {
    /// Wire and storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}
