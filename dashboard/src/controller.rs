//! Dashboard controller: wires sources, resolver and gold fetcher together.

use std::sync::Arc;
use std::time::Duration;

use goldrate_common::{CurrencyPair, HttpFetch, ReqwestFetch};
use goldrate_fx::{
    CalibrationStore, ExchangeRate, JsonApiProvider, JsonFileStore, MarketApiProvider,
    PageScrapeProvider, RateCache, RateCacheConfig, RateProvider, RateResolver,
};
use goldrate_gold::{value_holding, GoldPriceFetcher, GoldPriceSnapshot, Holding, Valuation};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::metrics::RefreshMetrics;

/// One refresh of everything the dashboard shows.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub rate: ExchangeRate,
    pub cached: bool,
    pub prices: Option<GoldPriceSnapshot>,
}

/// Owns the resolver, the cache in front of it and the gold fetcher.
pub struct DashboardController {
    resolver: RateResolver,
    gold: GoldPriceFetcher,
    cache: RateCache,
    pair: CurrencyPair,
    metrics: Arc<RwLock<RefreshMetrics>>,
}

impl DashboardController {
    /// Build a controller that talks to the real sources.
    pub fn new(config: &DashboardConfig) -> anyhow::Result<Self> {
        let fetch: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new(&config.http_config())?);
        let store: Arc<dyn CalibrationStore> =
            Arc::new(JsonFileStore::new(config.calibration_file.clone()));
        Ok(Self::with_parts(config, fetch, store))
    }

    /// Build a controller over an explicit fetcher and calibration store.
    pub fn with_parts(
        config: &DashboardConfig,
        fetch: Arc<dyn HttpFetch>,
        store: Arc<dyn CalibrationStore>,
    ) -> Self {
        let providers: Vec<Arc<dyn RateProvider>> = vec![
            Arc::new(PageScrapeProvider::new(fetch.clone(), config.primary_url.clone())),
            Arc::new(
                JsonApiProvider::new(fetch.clone(), config.secondary_url.clone())
                    .with_denomination(config.denomination.clone()),
            ),
            Arc::new(
                MarketApiProvider::new(fetch.clone(), config.market_url.clone())
                    .with_spread(config.spread),
            ),
        ];

        let interval = chrono::Duration::seconds(config.refresh_secs as i64);
        let cache = RateCache::with_config(RateCacheConfig {
            default_ttl: interval,
            degraded_ttl: interval.min(RateCacheConfig::default().degraded_ttl),
        });

        Self {
            resolver: RateResolver::new(providers, store, config.resolver_config()),
            gold: GoldPriceFetcher::new(fetch, config.gold_url.clone()),
            cache,
            pair: CurrencyPair::cny_thb(),
            metrics: Arc::new(RwLock::new(RefreshMetrics::new())),
        }
    }

    /// Current rate, from the cache when still fresh.
    pub async fn current_rate(&self) -> (ExchangeRate, bool) {
        if let Some(rate) = self.cache.get(&self.pair) {
            return (rate, true);
        }

        let rate = self.resolver.resolve().await;
        self.cache.insert(rate.clone());
        (rate, false)
    }

    /// Latest gold prices.
    pub async fn prices(&self) -> Option<GoldPriceSnapshot> {
        self.gold.get_latest_prices().await
    }

    /// Read the rate and gold prices once and record the outcome.
    pub async fn refresh(&self) -> Refresh {
        let ((rate, cached), prices) = tokio::join!(self.current_rate(), self.prices());

        {
            let mut metrics = self.metrics.write().await;
            metrics.record_rate(rate.source, rate.rate(), cached);
            metrics.record_gold(prices.is_some());
        }

        if rate.is_degraded() {
            warn!(rate = %rate.rate(), source = rate.source.label(), "Showing degraded rate");
        } else {
            info!(rate = %rate.rate(), source = rate.source.label(), cached, "Rate refreshed");
        }

        match &prices {
            Some(p) => info!(
                bullion_buy = %p.bullion_buy,
                bullion_sell = %p.bullion_sell,
                ornament_sell = %p.ornament_sell,
                "Gold prices refreshed"
            ),
            None => warn!("Gold prices unavailable"),
        }

        Refresh {
            rate,
            cached,
            prices,
        }
    }

    /// Refresh every `interval` until Ctrl+C, or until `duration` elapses.
    pub async fn run(&self, interval: Duration, duration: Option<Duration>) -> anyhow::Result<()> {
        info!(interval_secs = interval.as_secs(), "Starting refresh loop");

        let stop = async {
            match duration {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    Ok(())
                }
                None => tokio::signal::ctrl_c().await,
            }
        };
        tokio::pin!(stop);

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                result = &mut stop => {
                    result?;
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }

        info!("Refresh loop stopped");
        Ok(())
    }

    /// Calibrate against a counter observation; the cache is dropped so the
    /// next read picks up the new offset.
    pub async fn calibrate(&self, observed: Decimal) -> anyhow::Result<Decimal> {
        let offset = self.resolver.calibrate(observed).await?;
        self.cache.clear();
        Ok(offset)
    }

    /// Reset the calibration offset to zero.
    pub async fn clear_calibration(&self) -> anyhow::Result<()> {
        self.resolver.clear_calibration().await?;
        self.cache.clear();
        Ok(())
    }

    /// Value a holding at today's prices.
    pub async fn value(&self, holding: &Holding) -> anyhow::Result<Valuation> {
        let (rate, _) = self.current_rate().await;
        let prices = self
            .prices()
            .await
            .ok_or_else(|| anyhow::anyhow!("gold prices unavailable"))?;
        Ok(value_holding(holding, &prices, &rate)?)
    }

    /// Names of the rate sources, in priority order.
    pub fn source_names(&self) -> Vec<&str> {
        self.resolver.provider_names()
    }

    /// Snapshot of the refresh metrics.
    pub async fn get_metrics(&self) -> RefreshMetrics {
        self.metrics.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldrate_common::StaticFetch;
    use goldrate_fx::{MemoryStore, RateSource};
    use goldrate_gold::WeightUnit;
    use rust_decimal_macros::dec;

    const BOARD: &str = r#"<table>
        <tr><td>USD</td><td>100</td><td>35.10</td><td>35.25</td></tr>
        <tr><td>CNY</td><td>100</td><td>4.47</td><td>4.51</td></tr>
    </table>"#;

    const GOLD: &str = r#"<div>ทองคำแท่ง <b>รับซื้อ</b> 42,000.00 <b>ขายออก</b> 42,100.00
        ทองรูปพรรณ ขายออก 42,600.00 ฐานภาษี 40,900.00</div>"#;

    fn config() -> DashboardConfig {
        DashboardConfig::default()
    }

    fn controller(fetch: StaticFetch) -> (DashboardController, Arc<StaticFetch>) {
        let fetch = Arc::new(fetch);
        let controller =
            DashboardController::with_parts(&config(), fetch.clone(), Arc::new(MemoryStore::new()));
        (controller, fetch)
    }

    #[tokio::test]
    async fn test_refresh_uses_primary_and_caches() {
        let cfg = config();
        let (controller, fetch) = controller(
            StaticFetch::new()
                .with_body(cfg.primary_url.clone(), BOARD)
                .with_body(cfg.gold_url.clone(), GOLD),
        );

        let first = controller.refresh().await;
        assert_eq!(first.rate.source, RateSource::PrimaryScrape);
        assert_eq!(first.rate.rate(), dec!(4.45));
        assert!(!first.cached);
        assert_eq!(first.prices.unwrap().bullion_buy, dec!(42000.00));

        let second = controller.refresh().await;
        assert!(second.cached);
        assert_eq!(fetch.hits(&cfg.primary_url), 1);

        let metrics = controller.get_metrics().await;
        assert_eq!(metrics.refreshes, 2);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.gold_failures, 0);
    }

    #[tokio::test]
    async fn test_everything_down_is_degraded() {
        let (controller, _) = controller(StaticFetch::new());

        let refresh = controller.refresh().await;
        assert_eq!(refresh.rate.source, RateSource::FallbackConstant);
        assert_eq!(refresh.rate.rate(), dec!(4.48));
        assert!(refresh.prices.is_none());

        let metrics = controller.get_metrics().await;
        assert_eq!(metrics.degraded, 1);
        assert_eq!(metrics.gold_failures, 1);
    }

    #[tokio::test]
    async fn test_calibrate_invalidates_cache() {
        let cfg = config();
        let (controller, fetch) =
            controller(StaticFetch::new().with_body(cfg.primary_url.clone(), BOARD));

        let (before, _) = controller.current_rate().await;
        assert_eq!(before.rate(), dec!(4.45));

        let offset = controller.calibrate(dec!(4.67)).await.unwrap();
        assert_eq!(offset, dec!(0.20));

        let (after, cached) = controller.current_rate().await;
        assert!(!cached);
        assert_eq!(after.rate(), dec!(4.65));
        assert_eq!(fetch.hits(&cfg.primary_url), 3);

        controller.clear_calibration().await.unwrap();
        let (cleared, _) = controller.current_rate().await;
        assert_eq!(cleared.rate(), dec!(4.45));
    }

    #[tokio::test]
    async fn test_value_holding() {
        let cfg = config();
        let (controller, _) = controller(
            StaticFetch::new()
                .with_body(cfg.primary_url.clone(), BOARD)
                .with_body(cfg.gold_url.clone(), GOLD),
        );

        let holding = Holding::new(dec!(1), WeightUnit::Baht, dec!(40000));
        let valuation = controller.value(&holding).await.unwrap();
        assert_eq!(valuation.market_value_thb, dec!(42000.00));
        assert_eq!(valuation.profit_thb, dec!(2000.00));
    }

    #[tokio::test]
    async fn test_run_stops_after_duration() {
        let (controller, _) = controller(StaticFetch::new());

        controller
            .run(Duration::from_millis(10), Some(Duration::from_millis(35)))
            .await
            .unwrap();

        let metrics = controller.get_metrics().await;
        assert!(metrics.refreshes >= 1);
        assert_eq!(controller.source_names().len(), 3);
    }
}
