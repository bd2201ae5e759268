pub mod caching;
pub mod frankfurter;
pub mod open_er;
pub mod util;

pub use caching::{CachedRetriever, HistoricalRatesCache, LatestRatesCache};
pub use frankfurter::FrankfurterProvider;
pub use open_er::OpenErProvider;
