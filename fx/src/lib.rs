//! Goldrate FX Resolver
//!
//! Resolves the CNY/THB rate a Thai money-changer would quote right now.
//!
//! # Features
//!
//! - Ordered fallback chain: page scrape, JSON API, market-rate API
//! - Hardcoded fallback quote when every source is down, tagged as degraded
//! - Manual calibration offset persisted in a swappable store
//! - Rounding to the counter's 0.05 quoting granularity
//! - Caller-side TTL cache
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use goldrate_fx::calibration::DEFAULT_CALIBRATION_FILE;
//! use goldrate_fx::{JsonFileStore, RateResolver, ResolverConfig};
//!
//! let store = Arc::new(JsonFileStore::new(DEFAULT_CALIBRATION_FILE));
//! let resolver = RateResolver::new(providers, store, ResolverConfig::default());
//!
//! let rate = resolver.resolve().await;
//! println!("{} ({})", rate.rate(), rate.source.label());
//!
//! // After reading 4.70 off a counter board
//! let offset = resolver.calibrate(dec!(4.70)).await?;
//! ```

pub mod api;
pub mod cache;
pub mod calibration;
pub mod engine;
pub mod error;
pub mod market;
pub mod page;
pub mod provider;
pub mod rate;

pub use api::JsonApiProvider;
pub use cache::{RateCache, RateCacheConfig};
pub use calibration::{CalibrationRecord, CalibrationStore, JsonFileStore, MemoryStore};
pub use engine::{RateResolver, ResolverConfig};
pub use error::{CalibrationError, RateError, SourceError};
pub use market::{MarketApiProvider, Spread};
pub use page::PageScrapeProvider;
pub use provider::RateProvider;
pub use rate::{ExchangeRate, RateSource};
