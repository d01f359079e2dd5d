//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Price is zero or negative after rounding to cents
    #[error("Price must be greater than 0: {0}")]
    PriceNotPositive(String),

    /// Price exceeds the largest storable amount
    #[error("Price is too high: {0}")]
    PriceTooHigh(String),

    /// Unknown product status
    #[error("Invalid product status: {0}")]
    InvalidStatus(String),

    /// Product identifier is empty
    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),
}
