//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod converter;
pub mod currency;
pub mod error;
pub mod history;
pub mod identity;
pub mod log;
pub mod rates;
pub mod task;

// Re-export main types for cleaner imports
pub use currency::CurrencyCode;
pub use error::{RateError, RateResult};
pub use rates::{HistoricalRates, HistoricalSeries, LatestRates, RateTable, Span};
