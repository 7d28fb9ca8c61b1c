//! Goldrate Common Types
//!
//! This crate contains shared types used across the goldrate workspace,
//! including currency and quote types, decimal rounding, time helpers and
//! the outbound HTTP fetch seam used by every scraper.

pub mod monetary;
pub mod error;
pub mod http;
pub mod time;

pub use monetary::*;
pub use error::*;
pub use http::*;
pub use time::*;
