//! Price value object
//!
//! Monetary amounts are exact decimals with two fractional digits, the same
//! precision as a `DECIMAL(10,2)` column. Inputs with more digits are rounded
//! half away from zero.
//!
//! # Examples
//!
//! ```
//! use domain::Price;
//! use rust_decimal::Decimal;
//!
//! let price = Price::new(Decimal::new(19_995, 3)).unwrap();
//! assert_eq!(price.to_string(), "20.00");
//! assert_eq!(price.minor_units(), 2000);
//! ```

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Largest accepted amount: 9,999,999.99
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// A strictly positive amount with cent precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Check bounds and round to cents
    ///
    /// The upper bound applies to the unrounded amount. An amount that rounds
    /// to zero is not positive.
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount > MAX_PRICE {
            return Err(DomainError::PriceTooHigh(amount.to_string()));
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(DomainError::PriceNotPositive(amount.to_string()));
        }
        Ok(Self(rounded))
    }

    /// Rebuild a price from a stored cent amount
    pub fn from_minor_units(cents: i64) -> Result<Self, DomainError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The exact decimal amount
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount in cents
    pub fn minor_units(&self) -> i64 {
        let mut scaled = self.0;
        scaled.rescale(2);
        // bounded by MAX_PRICE
        i64::try_from(scaled.mantissa()).unwrap_or(i64::MAX)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scaled = self.0;
        scaled.rescale(2);
        write!(f, "{scaled}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_amount() {
        let price = Price::new(Decimal::new(4999, 2)).unwrap();
        assert_eq!(price.amount(), Decimal::new(4999, 2));
        assert_eq!(price.minor_units(), 4999);
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(matches!(
            Price::new(Decimal::ZERO),
            Err(DomainError::PriceNotPositive(_))
        ));
        assert!(matches!(
            Price::new(Decimal::new(-1, 0)),
            Err(DomainError::PriceNotPositive(_))
        ));
    }

    #[test]
    fn rejects_amount_that_rounds_to_zero() {
        assert!(Price::new(Decimal::new(4, 3)).is_err());
    }

    #[test]
    fn accepts_upper_bound() {
        let price = Price::new(MAX_PRICE).unwrap();
        assert_eq!(price.minor_units(), 999_999_999);
        assert_eq!(price.to_string(), "9999999.99");
    }

    #[test]
    fn rejects_above_upper_bound() {
        assert!(matches!(
            Price::new(Decimal::new(1_000_000_000, 2)),
            Err(DomainError::PriceTooHigh(_))
        ));
    }

    #[test]
    fn rejects_fraction_above_upper_bound() {
        for raw in [9_999_999_994_i64, 9_999_999_995] {
            assert!(matches!(
                Price::new(Decimal::new(raw, 3)),
                Err(DomainError::PriceTooHigh(_))
            ));
        }
        assert_eq!(
            Price::new(Decimal::new(9_999_999_985, 3)).unwrap().amount(),
            MAX_PRICE
        );
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(1005, 3)).unwrap();
        assert_eq!(price.minor_units(), 101);
    }

    #[test]
    fn display_always_has_two_decimals() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(price.to_string(), "5.00");
    }

    #[test]
    fn minor_units_roundtrip() {
        let price = Price::from_minor_units(123_456).unwrap();
        assert_eq!(price.amount(), Decimal::new(123_456, 2));
        assert_eq!(price.minor_units(), 123_456);
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        let result: Result<Price, _> = serde_json::from_str("\"0\"");
        assert!(result.is_err());
    }

    #[test]
    fn ordering_follows_amount() {
        let low = Price::new(Decimal::new(1, 0)).unwrap();
        let high = Price::new(Decimal::new(2, 0)).unwrap();
        assert!(low < high);
    }
}
