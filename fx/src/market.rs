//! Tier 3: generic market-rate API with an estimated retail spread.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use goldrate_common::{parse_decimal_loose, Currency, HttpFetch, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SourceError, SourceResult};
use crate::provider::{check_plausible, RateProvider};
use crate::rate::RateSource;

/// Margins used to turn a wholesale mid rate into a retail quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    /// Subtracted from the mid rate for the buy side.
    pub buy_margin: Decimal,
    /// Added to the mid rate for the sell side.
    pub sell_margin: Decimal,
}

impl Default for Spread {
    fn default() -> Self {
        Self {
            buy_margin: Decimal::new(2, 2),
            sell_margin: Decimal::new(2, 2),
        }
    }
}

impl Spread {
    /// Apply the spread to a mid-market rate, or `None` on overflow.
    pub fn apply(&self, mid: Decimal) -> Option<Quote> {
        Some(Quote::new(
            mid.checked_sub(self.buy_margin)?,
            mid.checked_add(self.sell_margin)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, Value>,
}

/// Reads `rates.THB` from a `<base_url>/<ISO code>` market-rate API.
pub struct MarketApiProvider {
    fetch: Arc<dyn HttpFetch>,
    base_url: String,
    base_currency: Currency,
    spread: Spread,
}

impl MarketApiProvider {
    /// Create a provider keyed by CNY.
    pub fn new(fetch: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into(),
            base_currency: Currency::cny(),
            spread: Spread::default(),
        }
    }

    /// Use a different retail spread.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spread = spread;
        self
    }

    /// URL requested for the configured base currency.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.base_currency.code()
        )
    }
}

#[async_trait]
impl RateProvider for MarketApiProvider {
    fn name(&self) -> &str {
        "market-api"
    }

    fn tier(&self) -> RateSource {
        RateSource::TertiaryApi
    }

    async fn try_fetch(&self) -> SourceResult<Quote> {
        let body = self.fetch.get_text(&self.url()).await?;
        let mid = parse_thb_rate(&body)?;
        let quote = self
            .spread
            .apply(mid)
            .ok_or_else(|| SourceError::Malformed(format!("spread overflows on {mid}")))?;
        check_plausible(quote)
    }
}

/// Extract the positive `rates.THB` value.
pub fn parse_thb_rate(body: &str) -> SourceResult<Decimal> {
    let latest: LatestRates = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("unexpected market API body: {e}")))?;

    let raw = latest
        .rates
        .get("THB")
        .ok_or_else(|| SourceError::Malformed("rates.THB missing".to_string()))?;

    let rate = match raw {
        Value::Number(n) => parse_decimal_loose(&n.to_string()),
        Value::String(s) => parse_decimal_loose(s),
        _ => None,
    }
    .filter(|r| *r > Decimal::ZERO)
    .ok_or_else(|| SourceError::Malformed(format!("rates.THB is not a rate: {raw}")))?;

    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldrate_common::StaticFetch;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_thb_rate() {
        let body =
            r#"{"base":"CNY","date":"2026-10-16","rates":{"CNY":1,"THB":4.5175,"USD":0.14}}"#;
        assert_eq!(parse_thb_rate(body).unwrap(), dec!(4.5175));
    }

    #[test]
    fn test_missing_thb() {
        let body = r#"{"rates":{"USD":0.14}}"#;
        assert!(matches!(parse_thb_rate(body), Err(SourceError::Malformed(_))));
        assert!(parse_thb_rate(r#"{"result":"error"}"#).is_err());
        assert!(parse_thb_rate(r#"{"rates":{"THB":0}}"#).is_err());
    }

    #[test]
    fn test_spread_applied() {
        let quote = Spread::default().apply(dec!(4.5175)).unwrap();
        assert_eq!(quote, Quote::new(dec!(4.4975), dec!(4.5375)));
        assert!(Spread::default().apply(Decimal::MAX).is_none());
    }

    #[tokio::test]
    async fn test_huge_market_rate_is_malformed() {
        let fetch = Arc::new(StaticFetch::new().with_body(
            "https://fx.test/latest/CNY",
            r#"{"rates":{"THB":"10000000000000000000000000000"}}"#,
        ));
        let provider = MarketApiProvider::new(fetch, "https://fx.test/latest");

        assert!(matches!(
            provider.try_fetch().await,
            Err(SourceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_keyed_by_currency() {
        let fetch = Arc::new(StaticFetch::new().with_body(
            "https://fx.test/latest/CNY",
            r#"{"rates":{"THB":"4.60"}}"#,
        ));
        let provider = MarketApiProvider::new(fetch.clone(), "https://fx.test/latest/")
            .with_spread(Spread {
                buy_margin: dec!(0.05),
                sell_margin: dec!(0.03),
            });

        let quote = provider.try_fetch().await.unwrap();
        assert_eq!(quote, Quote::new(dec!(4.55), dec!(4.63)));
        assert_eq!(fetch.hits("https://fx.test/latest/CNY"), 1);
        assert_eq!(provider.tier(), RateSource::TertiaryApi);
    }
}
