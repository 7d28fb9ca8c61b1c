//! Dashboard configuration.

use std::path::PathBuf;
use std::time::Duration;

use goldrate_common::{constants, DurationExt, HttpConfig, Quote, BROWSER_USER_AGENT};
use goldrate_fx::api::DEFAULT_DENOMINATION;
use goldrate_fx::calibration::DEFAULT_CALIBRATION_FILE;
use goldrate_fx::{ResolverConfig, Spread};
use goldrate_gold::DEFAULT_GOLD_URL;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Money-changer rate board (tier 1).
    pub primary_url: String,
    /// Money-changer JSON API (tier 2).
    pub secondary_url: String,
    /// Market-rate API base URL (tier 3).
    pub market_url: String,
    /// Gold association price page.
    pub gold_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Where the calibration record lives.
    pub calibration_file: PathBuf,
    /// Refresh interval in seconds.
    pub refresh_secs: u64,
    /// Denomination row read from the JSON API.
    pub denomination: String,
    /// Margins applied to the market mid rate.
    pub spread: Spread,
    /// Quote used when every source is down.
    pub fallback: Quote,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://www.superrichthailand.com/exchange".to_string(),
            secondary_url: "https://www.superrichthailand.com/api/v1/rates".to_string(),
            market_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
            gold_url: DEFAULT_GOLD_URL.to_string(),
            timeout_secs: constants::fetch_timeout().num_seconds() as u64,
            user_agent: BROWSER_USER_AGENT.to_string(),
            calibration_file: PathBuf::from(DEFAULT_CALIBRATION_FILE),
            refresh_secs: constants::refresh_interval().num_seconds() as u64,
            denomination: DEFAULT_DENOMINATION.to_string(),
            spread: Spread::default(),
            fallback: ResolverConfig::default().fallback,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from `GOLDRATE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, starting from defaults.
    ///
    /// Values that fail to parse are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("GOLDRATE_PRIMARY_URL") {
            config.primary_url = url;
        }
        if let Some(url) = lookup("GOLDRATE_SECONDARY_URL") {
            config.secondary_url = url;
        }
        if let Some(url) = lookup("GOLDRATE_MARKET_URL") {
            config.market_url = url;
        }
        if let Some(url) = lookup("GOLDRATE_GOLD_URL") {
            config.gold_url = url;
        }
        if let Some(secs) = lookup("GOLDRATE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.timeout_secs = secs;
        }
        if let Some(agent) = lookup("GOLDRATE_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(path) = lookup("GOLDRATE_CALIBRATION_FILE") {
            config.calibration_file = PathBuf::from(path);
        }
        if let Some(secs) = lookup("GOLDRATE_REFRESH_SECS").and_then(|v| v.parse().ok()) {
            config.refresh_secs = secs;
        }
        if let Some(denomination) = lookup("GOLDRATE_DENOMINATION") {
            config.denomination = denomination;
        }

        let decimal = |key: &str| lookup(key).and_then(|v| v.trim().parse::<Decimal>().ok());

        if let Some(margin) = decimal("GOLDRATE_BUY_MARGIN") {
            config.spread.buy_margin = margin;
        }
        if let Some(margin) = decimal("GOLDRATE_SELL_MARGIN") {
            config.spread.sell_margin = margin;
        }
        if let Some(buy) = decimal("GOLDRATE_FALLBACK_BUY") {
            config.fallback.buy = buy;
        }
        if let Some(sell) = decimal("GOLDRATE_FALLBACK_SELL") {
            config.fallback.sell = sell;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("primary", &self.primary_url),
            ("secondary", &self.secondary_url),
            ("market", &self.market_url),
            ("gold", &self.gold_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{name} URL must be http(s): {url:?}"));
            }
        }

        if self.timeout_secs == 0 {
            return Err("Timeout cannot be 0".to_string());
        }

        let interval = chrono::Duration::seconds(self.refresh_secs as i64);
        if interval < constants::min_refresh_interval()
            || interval > constants::max_refresh_interval()
        {
            return Err(format!(
                "Refresh interval must be between {}s and {}s, got {}s",
                constants::min_refresh_interval().num_seconds(),
                constants::max_refresh_interval().num_seconds(),
                self.refresh_secs
            ));
        }

        if self.denomination.trim().is_empty() {
            return Err("Denomination cannot be empty".to_string());
        }

        if self.spread.buy_margin < Decimal::ZERO || self.spread.sell_margin < Decimal::ZERO {
            return Err("Spread margins cannot be negative".to_string());
        }

        if self.fallback.buy <= Decimal::ZERO || self.fallback.buy > self.fallback.sell {
            return Err(format!("Fallback quote is not sane: {}", self.fallback));
        }

        Ok(())
    }

    /// HTTP settings shared by every fetcher.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Resolver settings.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            fallback: self.fallback,
            ..ResolverConfig::default()
        }
    }

    /// Refresh interval as a std duration.
    pub fn refresh_interval(&self) -> Duration {
        chrono::Duration::seconds(self.refresh_secs as i64).as_std()
    }
}
