//! Rate provider trait and the test double.

use async_trait::async_trait;
use goldrate_common::Quote;
use rust_decimal::Decimal;

use crate::error::{SourceError, SourceResult};
use crate::rate::RateSource;

/// Currency markers that identify the CNY row or entry in a source.
pub const CURRENCY_MARKERS: &[&str] = &["CNY", "RMB", "人民币", "หยวน"];

/// Check whether `text` mentions one of the currency markers.
pub fn mentions_currency(text: &str) -> bool {
    let upper = text.to_uppercase();
    CURRENCY_MARKERS.iter().any(|m| upper.contains(m))
}

/// Largest THB-per-CNY value accepted from any source.
pub const MAX_PLAUSIBLE_RATE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Reject a quote no counter would post: both sides must be positive and
/// at most [`MAX_PLAUSIBLE_RATE`].
pub fn check_plausible(quote: Quote) -> SourceResult<Quote> {
    let in_range = |v: Decimal| v > Decimal::ZERO && v <= MAX_PLAUSIBLE_RATE;
    if in_range(quote.buy) && in_range(quote.sell) {
        Ok(quote)
    } else {
        Err(SourceError::Malformed(format!("implausible quote: {quote}")))
    }
}

/// One ranked source in the fallback chain.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Tier tag reported when this provider answers.
    fn tier(&self) -> RateSource;

    /// Fetch an uncalibrated CNY/THB quote.
    async fn try_fetch(&self) -> SourceResult<Quote>;
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tier: RateSource,
    quote: parking_lot::Mutex<Option<Quote>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider that answers with `quote`.
    pub fn answering(tier: RateSource, quote: Quote) -> Self {
        Self {
            name: format!("mock-{}", tier.tag().to_lowercase()),
            tier,
            quote: parking_lot::Mutex::new(Some(quote)),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a provider that always fails.
    pub fn failing(tier: RateSource) -> Self {
        Self {
            name: format!("mock-{}", tier.tag().to_lowercase()),
            tier,
            quote: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Change the quote returned by later calls.
    pub fn set_quote(&self, quote: Option<Quote>) {
        *self.quote.lock() = quote;
    }

    /// Number of times `try_fetch` ran.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> RateSource {
        self.tier
    }

    async fn try_fetch(&self) -> SourceResult<Quote> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        (*self.quote.lock())
            .ok_or_else(|| SourceError::Unreachable(format!("{} is down", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mentions_currency() {
        assert!(mentions_currency("China (CNY) 100"));
        assert!(mentions_currency("rmb cash"));
        assert!(mentions_currency("人民币 现钞"));
        assert!(mentions_currency("หยวนจีน"));
        assert!(!mentions_currency("USD 50-100"));
    }

    #[test]
    fn test_check_plausible() {
        assert!(check_plausible(Quote::new(dec!(4.47), dec!(4.51))).is_ok());
        assert!(check_plausible(Quote::new(dec!(4.47), dec!(1000))).is_ok());

        for quote in [
            Quote::new(Decimal::ZERO, dec!(4.51)),
            Quote::new(dec!(-4.47), dec!(4.51)),
            Quote::new(dec!(4.47), dec!(1000.01)),
            Quote::new(dec!(4.47), Decimal::MAX),
        ] {
            assert!(matches!(
                check_plausible(quote),
                Err(SourceError::Malformed(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockRateProvider::answering(
            RateSource::PrimaryScrape,
            Quote::new(dec!(4.47), dec!(4.51)),
        );

        let quote = provider.try_fetch().await.unwrap();
        assert_eq!(quote.buy, dec!(4.47));
        assert_eq!(provider.calls(), 1);

        provider.set_quote(None);
        assert!(provider.try_fetch().await.is_err());
        assert_eq!(provider.calls(), 2);
    }
}
