//! The rate resolver: ordered fallback chain plus calibration.

use std::sync::Arc;

use goldrate_common::{Quote, DEFAULT_ROUNDING_INCREMENT};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::calibration::{CalibrationRecord, CalibrationStore};
use crate::error::{CalibrationError, RateError, RateResult};
use crate::provider::{check_plausible, RateProvider, MAX_PLAUSIBLE_RATE};
use crate::rate::{ExchangeRate, RateSource};

/// Configuration for the rate resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Quote returned when every source fails.
    pub fallback: Quote,
    /// Granularity the calibrated rate is rounded to.
    pub rounding_increment: Decimal,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback: Quote::new(Decimal::new(448, 2), Decimal::new(452, 2)),
            rounding_increment: DEFAULT_ROUNDING_INCREMENT,
        }
    }
}

/// Resolves the best available CNY/THB rate.
///
/// Holds no state between calls apart from what the calibration store
/// persists, so concurrent `resolve()` calls are safe.
pub struct RateResolver {
    providers: Vec<Arc<dyn RateProvider>>,
    store: Arc<dyn CalibrationStore>,
    config: ResolverConfig,
}

impl RateResolver {
    /// Create a resolver over `providers`, tried in order.
    pub fn new(
        providers: Vec<Arc<dyn RateProvider>>,
        store: Arc<dyn CalibrationStore>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            providers,
            store,
            config,
        }
    }

    /// Names of the configured providers, in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve the current rate. Never fails.
    ///
    /// The first provider that answers wins; its quote gets the stored
    /// offset added and is then rounded. When every provider fails the
    /// configured fallback is returned verbatim and tagged as degraded.
    /// An offset that would push the quote out of range is ignored.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> ExchangeRate {
        let Some((base, source)) = self.first_quote().await else {
            warn!(
                buy = %self.config.fallback.buy,
                sell = %self.config.fallback.sell,
                "All rate sources exhausted, using fallback constant"
            );
            return self.fallback_rate();
        };

        let stored = self.store.load_offset();
        let (offset, quote) = match self.calibrated(base, stored) {
            Some(quote) => (stored, quote),
            None => {
                warn!(offset = %stored, "Calibration offset unusable, resolving uncalibrated");
                match self.calibrated(base, Decimal::ZERO) {
                    Some(quote) => (Decimal::ZERO, quote),
                    None => return self.fallback_rate(),
                }
            }
        };

        info!(
            source = %source,
            base_buy = %base.buy,
            offset = %offset,
            buy = %quote.buy,
            sell = %quote.sell,
            "Rate resolved"
        );

        ExchangeRate::new(base, offset, quote, source)
    }

    fn fallback_rate(&self) -> ExchangeRate {
        ExchangeRate::new(
            self.config.fallback,
            Decimal::ZERO,
            self.config.fallback,
            RateSource::FallbackConstant,
        )
    }

    /// Apply `offset` and round, or `None` if the result overflows or leaves
    /// the plausible range.
    fn calibrated(&self, base: Quote, offset: Decimal) -> Option<Quote> {
        base.offset_by(offset)?
            .rounded(self.config.rounding_increment)
            .and_then(|quote| check_plausible(quote).ok())
    }

    /// Uncalibrated quote from the first provider that answers.
    pub async fn base_quote(&self) -> RateResult<(Quote, RateSource)> {
        self.first_quote().await.ok_or(RateError::SourceUnavailable)
    }

    /// Record a rate observed at a real counter and return the new offset.
    ///
    /// The offset is measured against the uncalibrated buy side of whichever
    /// source answers now. Nothing is written if no source answers.
    #[instrument(skip(self))]
    pub async fn calibrate(&self, observed: Decimal) -> RateResult<Decimal> {
        if observed <= Decimal::ZERO || observed > MAX_PLAUSIBLE_RATE {
            return Err(RateError::InvalidObservation(observed));
        }

        let previous = self.previous_offset()?;
        let (base, source) = self.base_quote().await?;

        let record = CalibrationRecord::new(observed, base.buy);
        self.store.save(&record)?;

        info!(
            source = %source,
            base = %base.buy,
            offset = %record.offset,
            previous = ?previous,
            "Calibration saved"
        );

        Ok(record.offset)
    }

    /// Reset the offset to zero against the current base rate.
    pub async fn clear_calibration(&self) -> RateResult<()> {
        let (base, _) = self.base_quote().await?;
        self.store.save(&CalibrationRecord::new(base.buy, base.buy))?;
        info!(base = %base.buy, "Calibration cleared");
        Ok(())
    }

    /// Offset currently stored, as `resolve()` would apply it.
    pub fn current_offset(&self) -> Decimal {
        self.store.load_offset()
    }

    /// Read the prior record before overwriting it.
    ///
    /// A corrupt record is about to be replaced, so only I/O failures abort.
    fn previous_offset(&self) -> RateResult<Option<Decimal>> {
        match self.store.load() {
            Ok(record) => Ok(record.map(|r| r.offset)),
            Err(CalibrationError::Malformed(e)) => {
                warn!(error = %e, "Overwriting malformed calibration record");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn first_quote(&self) -> Option<(Quote, RateSource)> {
        for provider in &self.providers {
            match provider.try_fetch().await.and_then(check_plausible) {
                Ok(quote) => {
                    debug!(
                        provider = provider.name(),
                        buy = %quote.buy,
                        sell = %quote.sell,
                        "Got quote from provider"
                    );
                    return Some((quote, provider.tier()));
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed to return rate"
                    );
                }
            }
        }
        None
    }
}
