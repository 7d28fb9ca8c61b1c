//! Tier 1: full-text scrape of the primary money-changer page.

use std::sync::Arc;

use async_trait::async_trait;
use goldrate_common::{parse_decimal_loose, HttpFetch, Quote};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::provider::{mentions_currency, RateProvider};
use crate::rate::RateSource;

static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})*\.\d+|\d+\.\d+").unwrap());

/// Scrapes the buy/sell pair from the CNY row of an HTML rate table.
pub struct PageScrapeProvider {
    fetch: Arc<dyn HttpFetch>,
    url: String,
}

impl PageScrapeProvider {
    /// Create a provider for the page at `url`.
    pub fn new(fetch: Arc<dyn HttpFetch>, url: impl Into<String>) -> Self {
        Self {
            fetch,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for PageScrapeProvider {
    fn name(&self) -> &str {
        "page-scrape"
    }

    fn tier(&self) -> RateSource {
        RateSource::PrimaryScrape
    }

    async fn try_fetch(&self) -> SourceResult<Quote> {
        let html = self.fetch.get_text(&self.url).await?;
        parse_rate_table(&html)
    }
}

/// Split markup into the visible text of each table row.
///
/// Pages without any `<tr>` fall back to one entry per text line.
pub fn table_rows(html: &str) -> Vec<String> {
    let rows: Vec<String> = ROW
        .captures_iter(html)
        .map(|caps| strip_tags(&caps[1]))
        .collect();

    if !rows.is_empty() {
        return rows;
    }

    strip_tags(html)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn strip_tags(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    text.replace("&nbsp;", " ")
}

/// Find the first CNY row and take its last two decimals as buy/sell.
pub fn parse_rate_table(html: &str) -> SourceResult<Quote> {
    let row = table_rows(html)
        .into_iter()
        .find(|r| mentions_currency(r))
        .ok_or_else(|| SourceError::Malformed("no CNY row in rate table".to_string()))?;

    let numbers: Vec<_> = DECIMAL
        .find_iter(&row)
        .filter_map(|m| parse_decimal_loose(m.as_str()))
        .collect();

    debug!(row = %row.trim(), found = numbers.len(), "Matched CNY row");

    match numbers.as_slice() {
        [.., buy, sell] => Ok(Quote::new(*buy, *sell)),
        _ => Err(SourceError::Malformed(format!(
            "CNY row has {} decimal numbers, need 2",
            numbers.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldrate_common::StaticFetch;
    use rust_decimal_macros::dec;

    const BOARD: &str = r#"
        <table class="rates">
          <tr><th>Currency</th><th>Denom</th><th>Buying</th><th>Selling</th></tr>
          <tr><td>USD</td><td>100</td><td>35.10</td><td>35.25</td></tr>
          <tr class="cny"><td><img src="cn.png"> CNY</td><td>100</td><td>4.47</td><td>4.51</td></tr>
          <tr><td>EUR</td><td>500</td><td>38.10</td><td>38.40</td></tr>
        </table>"#;

    #[test]
    fn test_parse_last_two_numbers_of_cny_row() {
        let quote = parse_rate_table(BOARD).unwrap();
        assert_eq!(quote.buy, dec!(4.47));
        assert_eq!(quote.sell, dec!(4.51));
    }

    #[test]
    fn test_integers_are_not_counted() {
        let html = "<tr><td>RMB</td><td>100</td><td>4.49</td></tr>";
        assert!(matches!(
            parse_rate_table(html),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn test_no_marker_row() {
        let html = "<tr><td>USD</td><td>35.10</td><td>35.25</td></tr>";
        assert!(parse_rate_table(html).is_err());
    }

    #[test]
    fn test_plain_text_page_uses_lines() {
        let text = "Rates today\n人民币 Cash 4.46 4.50\nJPY 0.23 0.24\n";
        let quote = parse_rate_table(text).unwrap();
        assert_eq!(quote, Quote::new(dec!(4.46), dec!(4.50)));
    }

    #[tokio::test]
    async fn test_provider_fetches_page() {
        let url = "https://rates.test/board";
        let fetch = Arc::new(StaticFetch::new().with_body(url, BOARD));
        let provider = PageScrapeProvider::new(fetch.clone(), url);

        let quote = provider.try_fetch().await.unwrap();
        assert_eq!(quote, Quote::new(dec!(4.47), dec!(4.51)));
        assert_eq!(provider.tier(), RateSource::PrimaryScrape);
        assert_eq!(fetch.hits(url), 1);
    }

    #[tokio::test]
    async fn test_provider_unreachable() {
        let provider =
            PageScrapeProvider::new(Arc::new(StaticFetch::new()), "https://rates.test/down");
        assert!(matches!(
            provider.try_fetch().await,
            Err(SourceError::Unreachable(_))
        ));
    }
}
