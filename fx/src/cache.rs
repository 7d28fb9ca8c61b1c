//! Caller-side rate cache with TTL support.
//!
//! The resolver never caches; refresh loops put this in front of it so a
//! page reload inside the expiry window does not hit the sources again.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use goldrate_common::CurrencyPair;
use tracing::debug;

use crate::rate::ExchangeRate;

/// Cached rate entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    rate: ExchangeRate,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(rate: ExchangeRate, ttl: Duration) -> Self {
        Self {
            rate,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// TTL for live quotes.
    pub default_ttl: Duration,
    /// TTL for degraded (fallback) rates, so live sources are retried sooner.
    pub degraded_ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::minutes(5),
            degraded_ttl: Duration::minutes(1),
        }
    }
}

/// Thread-safe rate cache with TTL.
pub struct RateCache {
    cache: DashMap<CurrencyPair, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a rate from cache if valid.
    pub fn get(&self, pair: &CurrencyPair) -> Option<ExchangeRate> {
        if let Some(entry) = self.cache.get(pair) {
            if entry.is_valid() {
                debug!(pair = %pair, "Cache hit");
                return Some(entry.rate.clone());
            }
            debug!(pair = %pair, "Cache entry expired");
            drop(entry);
            self.cache.remove(pair);
        }

        debug!(pair = %pair, "Cache miss");
        None
    }

    /// Insert a rate, picking the TTL by whether it is degraded.
    pub fn insert(&self, rate: ExchangeRate) {
        let ttl = if rate.is_degraded() {
            self.config.degraded_ttl
        } else {
            self.config.default_ttl
        };
        self.insert_with_ttl(rate, ttl);
    }

    /// Insert a rate with custom TTL.
    pub fn insert_with_ttl(&self, rate: ExchangeRate, ttl: Duration) {
        let key = rate.pair.clone();
        self.cache.insert(key, CacheEntry::new(rate, ttl));
    }

    /// Clear all cached rates.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::RateSource;
    use goldrate_common::Quote;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn make_rate(source: RateSource) -> ExchangeRate {
        let quote = Quote::new(dec!(4.50), dec!(4.55));
        ExchangeRate::new(quote, Decimal::ZERO, quote, source)
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = RateCache::new();
        let rate = make_rate(RateSource::PrimaryScrape);

        cache.insert(rate.clone());

        let cached = cache.get(&CurrencyPair::cny_thb()).unwrap();
        assert_eq!(cached, rate);
    }

    #[test]
    fn test_cache_miss() {
        let cache = RateCache::new();
        assert!(cache.get(&CurrencyPair::cny_thb()).is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let config = RateCacheConfig {
            default_ttl: Duration::milliseconds(50),
            ..Default::default()
        };
        let cache = RateCache::with_config(config);
        let pair = CurrencyPair::cny_thb();

        cache.insert(make_rate(RateSource::TertiaryApi));
        assert!(cache.get(&pair).is_some());

        sleep(StdDuration::from_millis(60));

        assert!(cache.get(&pair).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_degraded_rates_expire_sooner() {
        let config = RateCacheConfig {
            default_ttl: Duration::minutes(5),
            degraded_ttl: Duration::milliseconds(20),
        };
        let cache = RateCache::with_config(config);

        cache.insert(make_rate(RateSource::FallbackConstant));
        assert_eq!(cache.len(), 1);
        sleep(StdDuration::from_millis(30));

        assert!(cache.get(&CurrencyPair::cny_thb()).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_clear() {
        let cache = RateCache::new();
        cache.insert(make_rate(RateSource::PrimaryScrape));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
