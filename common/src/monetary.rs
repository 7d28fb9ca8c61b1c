//! Monetary types for goldrate.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Quoting granularity of the reference money-changer.
pub const DEFAULT_ROUNDING_INCREMENT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Round `value` to the nearest multiple of `increment`.
///
/// Midpoints round away from zero, so `4.575` becomes `4.60`. The result is
/// rescaled to two decimal places so it prints the way counters quote it.
/// A zero or negative increment returns the value unchanged. Returns `None`
/// when the value is too large to round.
pub fn round_to_increment(value: Decimal, increment: Decimal) -> Option<Decimal> {
    if increment <= Decimal::ZERO {
        return Some(value);
    }

    let steps = value
        .checked_div(increment)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let mut rounded = steps.checked_mul(increment)?;
    rounded.rescale(2u32.max(increment.scale()));
    Some(rounded)
}

/// Round to the nearest 0.05.
pub fn round_to_nearest_0_05(value: Decimal) -> Option<Decimal> {
    round_to_increment(value, DEFAULT_ROUNDING_INCREMENT)
}

/// Parse a number as scraped from a page or a loosely typed API field.
///
/// Thousands separators and surrounding whitespace are ignored.
pub fn parse_decimal_loose(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            value: Decimal::ZERO,
            currency,
        }
    }

    /// Round to the currency's standard decimal places.
    pub fn round(&self) -> Self {
        let places = self.currency.decimal_places();
        Self {
            value: self.value.round_dp(places),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// Errors converting an amount between currencies.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    #[error("Conversion of {0} overflowed")]
    Overflow(Decimal),
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" => 0,
            _ => 2,
        }
    }

    pub fn cny() -> Self {
        Self::new("CNY")
    }

    pub fn thb() -> Self {
        Self::new("THB")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A currency pair for FX operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (being bought/sold).
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// The pair the dashboard tracks.
    pub fn cny_thb() -> Self {
        Self::new(Currency::cny(), Currency::thb())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A buy/sell pair as posted by a money-changer.
///
/// `buy` is what the counter pays for one unit of the base currency,
/// `sell` is what it charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub buy: Decimal,
    pub sell: Decimal,
}

impl Quote {
    /// Create a new quote.
    pub fn new(buy: Decimal, sell: Decimal) -> Self {
        Self { buy, sell }
    }

    /// Shift both sides by `delta`, or `None` on overflow.
    pub fn offset_by(&self, delta: Decimal) -> Option<Self> {
        Some(Self::new(
            self.buy.checked_add(delta)?,
            self.sell.checked_add(delta)?,
        ))
    }

    /// Round both sides to the nearest `increment`, or `None` on overflow.
    pub fn rounded(&self, increment: Decimal) -> Option<Self> {
        Some(Self::new(
            round_to_increment(self.buy, increment)?,
            round_to_increment(self.sell, increment)?,
        ))
    }

    /// Convert an amount of the quote currency back to the base at the sell side.
    pub fn convert_back_at_sell(
        &self,
        amount: &Money,
        pair: &CurrencyPair,
    ) -> Result<Money, ConversionError> {
        if amount.currency != pair.quote {
            return Err(ConversionError::CurrencyMismatch {
                expected: pair.quote.clone(),
                actual: amount.currency.clone(),
            });
        }
        if self.sell.is_zero() {
            return Ok(Money::zero(pair.base.clone()));
        }
        let value = amount
            .value
            .checked_div(self.sell)
            .ok_or(ConversionError::Overflow(amount.value))?;
        Ok(Money::new(value, pair.base.clone()).round())
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buy {} / sell {}", self.buy, self.sell)
    }
}
