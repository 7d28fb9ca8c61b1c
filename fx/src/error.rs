//! Rate resolver error types.

use goldrate_common::FetchError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a single source could not produce a quote.
///
/// Both variants are recovered inside the resolver by moving on to the
/// next source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure: timeout, DNS, refused connection, bad status.
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// The document arrived but the expected marker or fields were absent.
    #[error("Source malformed: {0}")]
    Malformed(String),
}

impl From<FetchError> for SourceError {
    fn from(err: FetchError) -> Self {
        if err.is_timeout_or_network() {
            SourceError::Unreachable(err.to_string())
        } else {
            SourceError::Malformed(err.to_string())
        }
    }
}

/// Errors reading or writing the calibration store.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The store exists but could not be read or written.
    #[error("Calibration store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record is not valid JSON or lacks an offset.
    #[error("Calibration record malformed: {0}")]
    Malformed(String),

    /// The record could not be encoded.
    #[error("Calibration record encoding failed: {0}")]
    Encode(String),
}

/// Errors surfaced by resolver operations that are allowed to fail.
///
/// `resolve()` never returns one of these; only calibration does.
#[derive(Debug, Error)]
pub enum RateError {
    /// No source produced an uncalibrated reference rate.
    #[error("No rate source available")]
    SourceUnavailable,

    /// The observed rate cannot be a real quote.
    #[error("Invalid observed rate: {0}")]
    InvalidObservation(Decimal),

    /// The calibration store failed.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Result type for per-source fetches.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for resolver operations.
pub type RateResult<T> = Result<T, RateError>;
