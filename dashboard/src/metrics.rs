//! Refresh loop metrics.

use std::collections::HashMap;

use goldrate_fx::RateSource;
use rust_decimal::Decimal;

/// Counters kept by the refresh loop.
#[derive(Debug, Clone, Default)]
pub struct RefreshMetrics {
    /// Refresh cycles run.
    pub refreshes: u64,
    /// Rate reads served from the cache.
    pub cache_hits: u64,
    /// Rates that came from the fallback constant.
    pub degraded: u64,
    /// Gold snapshot fetches that returned nothing.
    pub gold_failures: u64,
    /// Last rate shown.
    pub last_rate: Option<Decimal>,
    by_source: HashMap<RateSource, u64>,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rate read.
    pub fn record_rate(&mut self, source: RateSource, rate: Decimal, cached: bool) {
        self.refreshes += 1;
        if cached {
            self.cache_hits += 1;
        }
        if source.is_degraded() {
            self.degraded += 1;
        }
        *self.by_source.entry(source).or_insert(0) += 1;
        self.last_rate = Some(rate);
    }

    /// Record a gold fetch outcome.
    pub fn record_gold(&mut self, ok: bool) {
        if !ok {
            self.gold_failures += 1;
        }
    }

    /// Rate reads attributed to `source`.
    pub fn count_for(&self, source: RateSource) -> u64 {
        self.by_source.get(&source).copied().unwrap_or(0)
    }

    /// Share of reads that fell back to the constant.
    pub fn degraded_ratio(&self) -> f64 {
        if self.refreshes == 0 {
            return 0.0;
        }

        self.degraded as f64 / self.refreshes as f64
    }
}
