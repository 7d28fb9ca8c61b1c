//! Gold price fetcher for the Gold Traders Association board.

use std::sync::Arc;

use goldrate_common::{local_stamp, parse_decimal_loose, HttpFetch};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default price page.
pub const DEFAULT_GOLD_URL: &str = "https://www.goldtraders.or.th/";

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static BULLION_BUY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)ทองคำแท่ง.*?รับซื้อ.*?(\d[\d,]*(?:\.\d+)?)").unwrap());
static BULLION_SELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)ทองคำแท่ง.*?ขายออก.*?(\d[\d,]*(?:\.\d+)?)").unwrap());
static ORNAMENT_SELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)ทองรูปพรรณ.*?ขายออก.*?(\d[\d,]*(?:\.\d+)?)").unwrap());
static TAX_BASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)ฐานภาษี.*?(\d[\d,]*(?:\.\d+)?)").unwrap());

/// Latest association prices, in THB per baht weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldPriceSnapshot {
    /// What dealers pay for 96.5% bullion.
    pub bullion_buy: Decimal,
    /// What dealers charge for 96.5% bullion.
    pub bullion_sell: Decimal,
    /// What dealers charge for ornaments.
    pub ornament_sell: Decimal,
    /// Ornament tax base.
    pub tax_base: Decimal,
    /// Local time the page was read.
    pub update_time: String,
}

/// Reads gold prices from a single fixed page. No fallback chain.
pub struct GoldPriceFetcher {
    fetch: Arc<dyn HttpFetch>,
    url: String,
}

impl GoldPriceFetcher {
    /// Create a fetcher for the page at `url`.
    pub fn new(fetch: Arc<dyn HttpFetch>, url: impl Into<String>) -> Self {
        Self {
            fetch,
            url: url.into(),
        }
    }

    /// Fetch and parse the latest prices, or `None` if the page is down or unrecognizable.
    pub async fn get_latest_prices(&self) -> Option<GoldPriceSnapshot> {
        let html = match self.fetch.get_text(&self.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Gold price fetch failed");
                return None;
            }
        };

        let snapshot = parse_gold_prices(&html);
        if snapshot.is_none() {
            warn!(url = %self.url, "No gold prices found on page");
        }
        snapshot
    }
}

fn extract(pattern: &Regex, text: &str) -> Option<Decimal> {
    pattern
        .captures(text)
        .and_then(|caps| parse_decimal_loose(&caps[1]))
}

/// Parse the association board.
///
/// Fields that cannot be found read as zero; a page with none of them
/// yields `None`.
pub fn parse_gold_prices(html: &str) -> Option<GoldPriceSnapshot> {
    let text = TAG.replace_all(html, " ");

    let fields = [
        extract(&BULLION_BUY, &text),
        extract(&BULLION_SELL, &text),
        extract(&ORNAMENT_SELL, &text),
        extract(&TAX_BASE, &text),
    ];

    if fields.iter().all(Option::is_none) {
        return None;
    }

    let [bullion_buy, bullion_sell, ornament_sell, tax_base] =
        fields.map(|f| f.unwrap_or_default());

    debug!(
        bullion_buy = %bullion_buy,
        bullion_sell = %bullion_sell,
        ornament_sell = %ornament_sell,
        tax_base = %tax_base,
        "Parsed gold prices"
    );

    Some(GoldPriceSnapshot {
        bullion_buy,
        bullion_sell,
        ornament_sell,
        tax_base,
        update_time: local_stamp(),
    })
}
