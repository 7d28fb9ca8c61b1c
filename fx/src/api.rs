//! Tier 2: structured JSON quote API.
//!
//! The upstream payload has no schema guarantee, so parsing tries a short,
//! fixed list of known shapes and gives up instead of walking the tree.

use std::sync::Arc;

use async_trait::async_trait;
use goldrate_common::{parse_decimal_loose, HttpFetch, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::provider::{mentions_currency, RateProvider};
use crate::rate::RateSource;

/// Denomination preferred when an entry lists several.
pub const DEFAULT_DENOMINATION: &str = "100";

/// Envelope keys that may hold the list of entries.
const LIST_KEYS: &[&str] = &["data", "rates", "result", "items"];

/// Reads the CNY entry from a JSON rate API.
pub struct JsonApiProvider {
    fetch: Arc<dyn HttpFetch>,
    url: String,
    denomination: String,
}

impl JsonApiProvider {
    /// Create a provider for the API at `url`.
    pub fn new(fetch: Arc<dyn HttpFetch>, url: impl Into<String>) -> Self {
        Self {
            fetch,
            url: url.into(),
            denomination: DEFAULT_DENOMINATION.to_string(),
        }
    }

    /// Prefer a different denomination.
    pub fn with_denomination(mut self, denomination: impl Into<String>) -> Self {
        self.denomination = denomination.into();
        self
    }
}

#[async_trait]
impl RateProvider for JsonApiProvider {
    fn name(&self) -> &str {
        "json-api"
    }

    fn tier(&self) -> RateSource {
        RateSource::SecondaryScrape
    }

    async fn try_fetch(&self) -> SourceResult<Quote> {
        let body = self.fetch.get_text(&self.url).await?;
        parse_rate_api(&body, &self.denomination)
    }
}

fn de_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => parse_decimal_loose(&n.to_string()),
        Value::String(s) => parse_decimal_loose(s),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("not a rate: {value}")))
}

fn de_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn label_mentions_currency(currency: &Option<String>, name: &Option<String>) -> bool {
    [currency, name]
        .into_iter()
        .flatten()
        .any(|s| mentions_currency(s))
}

#[derive(Debug, Deserialize)]
struct DenominationPair {
    #[serde(default, alias = "denomination", alias = "unit", deserialize_with = "de_label")]
    denom: Option<String>,
    #[serde(alias = "buying", alias = "bid", deserialize_with = "de_amount")]
    buy: Decimal,
    #[serde(alias = "selling", alias = "ask", deserialize_with = "de_amount")]
    sell: Decimal,
}

#[derive(Debug, Deserialize)]
struct DenominatedEntry {
    #[serde(
        default,
        alias = "code",
        alias = "currency_code",
        alias = "cur",
        deserialize_with = "de_label"
    )]
    currency: Option<String>,
    #[serde(default, alias = "title", alias = "description", deserialize_with = "de_label")]
    name: Option<String>,
    #[serde(alias = "denominations", alias = "rate")]
    rates: Vec<DenominationPair>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(
        default,
        alias = "code",
        alias = "currency_code",
        alias = "cur",
        deserialize_with = "de_label"
    )]
    currency: Option<String>,
    #[serde(default, alias = "title", alias = "description", deserialize_with = "de_label")]
    name: Option<String>,
    #[serde(alias = "buying", alias = "bid", deserialize_with = "de_amount")]
    buy: Decimal,
    #[serde(alias = "selling", alias = "ask", deserialize_with = "de_amount")]
    sell: Decimal,
}

/// Known entry layouts, tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Denominated(DenominatedEntry),
    Flat(FlatEntry),
}

impl Entry {
    fn mentions_currency(&self) -> bool {
        match self {
            Entry::Denominated(e) => label_mentions_currency(&e.currency, &e.name),
            Entry::Flat(e) => label_mentions_currency(&e.currency, &e.name),
        }
    }

    fn quote(&self, denomination: &str) -> Option<Quote> {
        match self {
            Entry::Flat(e) => Some(Quote::new(e.buy, e.sell)),
            Entry::Denominated(e) => e
                .rates
                .iter()
                .find(|r| r.denom.as_deref().map(str::trim) == Some(denomination))
                .or_else(|| e.rates.first())
                .map(|r| Quote::new(r.buy, r.sell)),
        }
    }
}

/// Pick out the candidate entries without descending past one envelope level.
///
/// The items of the first envelope key that holds an array come first; a
/// top-level object is only tried after them, so a labelled row inside the
/// envelope wins over a loosely labelled wrapper.
fn candidate_entries(root: Value) -> Vec<Value> {
    match root {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut entries = Vec::new();
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    entries.extend(items.iter().cloned());
                    break;
                }
            }
            entries.push(Value::Object(map));
            entries
        }
        _ => Vec::new(),
    }
}

/// Parse a rate API body and return the CNY quote.
pub fn parse_rate_api(body: &str, denomination: &str) -> SourceResult<Quote> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("invalid JSON: {e}")))?;

    for raw in candidate_entries(root) {
        let entry: Entry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.mentions_currency() {
            continue;
        }
        if let Some(quote) = entry.quote(denomination) {
            debug!(buy = %quote.buy, sell = %quote.sell, "Matched CNY entry");
            return Ok(quote);
        }
    }

    Err(SourceError::Malformed("no CNY entry in API response".to_string()))
}
