//! Non-negative decimal prices in Brazilian reais.
//!
//! Prices are typed in admin forms in the local convention (`199,90`), so
//! parsing accepts a comma as the decimal separator and normalizes it to a
//! point before handing the text to [`Decimal`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty after trimming.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    NotANumber(String),
    /// The value is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A price with two decimal places, never negative.
///
/// ## Examples
///
/// ```
/// use eletromcz_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::parse("199,90").unwrap();
/// assert_eq!(price.amount(), Decimal::new(19990, 2));
/// assert_eq!(price.to_brl(), "R$ 199,90");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse a price typed by a person.
    ///
    /// Surrounding whitespace is ignored, `,` is read as the decimal
    /// separator, and the result is rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not a number, or is negative.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let normalized = trimmed.replace(',', ".");
        let amount = Decimal::from_str(&normalized)
            .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))?;

        Self::new(amount)
    }

    /// Build a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_zero() {
            return Ok(Self::ZERO);
        }
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `R$ 1.299,90`.
    #[must_use]
    pub fn to_brl(&self) -> String {
        let fixed = format!("{:.2}", self.0);
        let (units, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("R$ {grouped},{cents}")
    }

    /// Plain form value with a comma separator, e.g. `199,90`.
    #[must_use]
    pub fn to_form_value(&self) -> String {
        format!("{:.2}", self.0).replace('.', ",")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_brl())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

// SQLx support (with postgres feature): stored as NUMERIC(10, 2)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_separator() {
        let price = Price::parse("199,90").unwrap();
        assert_eq!(price.amount(), Decimal::new(19990, 2));
    }

    #[test]
    fn test_parse_point_separator() {
        let price = Price::parse(" 49.5 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(4950, 2));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(Price::parse("10").unwrap().amount(), Decimal::new(10, 0));
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
        assert_eq!(Price::parse("-0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        assert_eq!(
            Price::parse("1,005").unwrap().amount(),
            Decimal::new(101, 2)
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse("-3,50"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Price::parse("12,3,4"),
            Err(PriceError::NotANumber(_))
        ));
        assert!(matches!(
            Price::parse("R$ 10"),
            Err(PriceError::NotANumber(_))
        ));
    }

    #[test]
    fn test_to_brl() {
        assert_eq!(Price::parse("0").unwrap().to_brl(), "R$ 0,00");
        assert_eq!(Price::parse("199,9").unwrap().to_brl(), "R$ 199,90");
        assert_eq!(Price::parse("1299.90").unwrap().to_brl(), "R$ 1.299,90");
        assert_eq!(
            Price::parse("1234567").unwrap().to_brl(),
            "R$ 1.234.567,00"
        );
    }

    #[test]
    fn test_to_form_value() {
        assert_eq!(Price::parse("199.9").unwrap().to_form_value(), "199,90");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-1.00\"");
        assert!(result.is_err());
    }
}
