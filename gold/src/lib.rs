//! Goldrate Gold Prices
//!
//! Thai gold association prices, weight units, and holding valuation.

pub mod error;
pub mod fetcher;
pub mod units;
pub mod valuation;

pub use error::{ValuationError, ValuationResult};
pub use fetcher::{parse_gold_prices, GoldPriceFetcher, GoldPriceSnapshot, DEFAULT_GOLD_URL};
pub use units::{baht_to_grams, grams_to_baht, GoldKind, WeightUnit};
pub use valuation::{value_holding, Holding, Valuation};
