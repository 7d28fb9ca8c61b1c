//! Resolved exchange rate value object.

use std::fmt;

use chrono::{DateTime, Utc};
use goldrate_common::{CurrencyPair, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which tier of the fallback chain produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// Full-text scrape of the primary quote page.
    PrimaryScrape,
    /// Structured JSON quote API.
    SecondaryScrape,
    /// Generic market-rate API with a retail spread applied.
    TertiaryApi,
    /// Hardcoded constant used when every source failed.
    FallbackConstant,
}

impl RateSource {
    /// Stable tag used in logs and JSON output.
    pub fn tag(&self) -> &'static str {
        match self {
            RateSource::PrimaryScrape => "PRIMARY_SCRAPE",
            RateSource::SecondaryScrape => "SECONDARY_SCRAPE",
            RateSource::TertiaryApi => "TERTIARY_API",
            RateSource::FallbackConstant => "FALLBACK_CONSTANT",
        }
    }

    /// Label shown next to the rate. The fallback label is marked as degraded.
    pub fn label(&self) -> &'static str {
        match self {
            RateSource::PrimaryScrape => "money-changer board",
            RateSource::SecondaryScrape => "money-changer API",
            RateSource::TertiaryApi => "market rate (estimated spread)",
            RateSource::FallbackConstant => "DEGRADED: fallback constant",
        }
    }

    /// True for the constant returned when nothing could be fetched.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RateSource::FallbackConstant)
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A CNY/THB rate as handed to the caller.
///
/// Created fresh by every `resolve()` call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// The currency pair.
    pub pair: CurrencyPair,
    /// Quote as produced by the source, before calibration.
    pub base: Quote,
    /// Calibration offset added to `base`.
    pub offset: Decimal,
    /// Calibrated and rounded quote.
    pub quote: Quote,
    /// Which tier answered.
    pub source: RateSource,
    /// When the rate was resolved.
    pub resolved_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Create a new rate stamped with the current time.
    pub fn new(base: Quote, offset: Decimal, quote: Quote, source: RateSource) -> Self {
        Self {
            pair: CurrencyPair::cny_thb(),
            base,
            offset,
            quote,
            source,
            resolved_at: Utc::now(),
        }
    }

    /// Headline rate: what a counter pays in THB for one CNY.
    pub fn rate(&self) -> Decimal {
        self.quote.buy
    }

    /// Buy side of the final quote.
    pub fn buy(&self) -> Decimal {
        self.quote.buy
    }

    /// Sell side of the final quote.
    pub fn sell(&self) -> Decimal {
        self.quote.sell
    }

    /// Whether this is the hardcoded fallback rather than a live quote.
    pub fn is_degraded(&self) -> bool {
        self.source.is_degraded()
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.pair, self.quote, self.source.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_degraded_label_differs() {
        assert!(RateSource::FallbackConstant.is_degraded());
        assert!(RateSource::FallbackConstant.label().starts_with("DEGRADED"));
        for source in [
            RateSource::PrimaryScrape,
            RateSource::SecondaryScrape,
            RateSource::TertiaryApi,
        ] {
            assert!(!source.is_degraded());
            assert!(!source.label().contains("DEGRADED"));
        }
    }

    #[test]
    fn test_source_serializes_as_tag() {
        let json = serde_json::to_string(&RateSource::TertiaryApi).unwrap();
        assert_eq!(json, "\"TERTIARY_API\"");
        assert_eq!(RateSource::TertiaryApi.to_string(), "TERTIARY_API");
    }

    #[test]
    fn test_rate_is_buy_side() {
        let rate = ExchangeRate::new(
            Quote::new(dec!(4.47), dec!(4.51)),
            Decimal::ZERO,
            Quote::new(dec!(4.45), dec!(4.50)),
            RateSource::PrimaryScrape,
        );
        assert_eq!(rate.rate(), dec!(4.45));
        assert_eq!(rate.sell(), dec!(4.50));
        assert_eq!(rate.pair, CurrencyPair::cny_thb());
    }
}
