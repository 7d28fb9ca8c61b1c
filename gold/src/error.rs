//! Valuation error types.

use goldrate_common::ConversionError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors valuing a gold holding.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Weight must be positive.
    #[error("Invalid weight: {0}")]
    InvalidWeight(Decimal),

    /// Cost cannot be negative.
    #[error("Invalid cost: {0}")]
    InvalidCost(Decimal),

    /// The snapshot has no usable dealer buy price.
    #[error("Gold buy price unavailable")]
    PriceUnavailable,

    /// The holding is too large to value.
    #[error("Valuation overflowed")]
    Overflow,

    #[error(transparent)]
    Currency(#[from] ConversionError),
}

/// Result type for valuation.
pub type ValuationResult<T> = Result<T, ValuationError>;
