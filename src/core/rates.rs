//! Rate data types and the abstractions over remote rate sources.

use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, RateResult};
use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Snapshot of rates relative to a single base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: CurrencyCode,
    pub rates: BTreeMap<CurrencyCode, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl RateTable {
    pub fn new(base: CurrencyCode, rates: BTreeMap<CurrencyCode, f64>) -> Self {
        Self {
            base,
            rates,
            fetched_at: Utc::now(),
        }
    }

    /// Rate of `code` against the base. The base itself is always 1.0, stored
    /// or not.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        if *code == self.base {
            return Some(1.0);
        }
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rate(code).is_some()
    }
}

/// Lookback window for a historical series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Span {
    OneYear,
    FiveYears,
    FifteenYears,
}

impl Span {
    pub const ALL: [Span; 3] = [Span::OneYear, Span::FiveYears, Span::FifteenYears];

    pub fn years(&self) -> u32 {
        match self {
            Span::OneYear => 1,
            Span::FiveYears => 5,
            Span::FifteenYears => 15,
        }
    }

    /// Inclusive `[today - years, today]`. Feb 29 clamps to Feb 28.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_months(Months::new(12 * self.years()))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}

impl TryFrom<u32> for Span {
    type Error = RateError;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        match years {
            1 => Ok(Span::OneYear),
            5 => Ok(Span::FiveYears),
            15 => Ok(Span::FifteenYears),
            other => Err(RateError::UnsupportedSpan(other)),
        }
    }
}

impl FromStr for Span {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['y', 'Y']);
        let years: u32 = trimmed
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid history period: {}", s))?;
        Ok(Span::try_from(years)?)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}y", self.years())
    }
}

/// Daily rates of `target` expressed in `base`, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub span: Span,
    pub points: Vec<(NaiveDate, f64)>,
}

impl HistoricalSeries {
    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    pub fn min(&self) -> Option<(NaiveDate, f64)> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn max(&self) -> Option<(NaiveDate, f64)> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Percent change from the first to the last point.
    pub fn change_percent(&self) -> Option<f64> {
        let (_, first) = self.first()?;
        let (_, last) = self.last()?;
        if first > 0.0 {
            Some(((last - first) / first) * 100.0)
        } else {
            None
        }
    }
}

/// Remote service returning the latest rates for a base currency.
#[async_trait]
pub trait LatestRateSource: Send + Sync {
    async fn fetch_latest(&self, base: &CurrencyCode) -> RateResult<RateTable>;
}

/// Remote service returning a daily time series between two currencies.
#[async_trait]
pub trait SeriesRateSource: Send + Sync {
    async fn fetch_series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        span: Span,
    ) -> RateResult<HistoricalSeries>;
}

/// Cache-aware access to the latest rates, as consumed by the converter.
#[async_trait]
pub trait LatestRates: Send + Sync {
    async fn latest(&self, base: &CurrencyCode, force_refresh: bool) -> RateResult<RateTable>;
}

/// Cache-aware access to historical series, as consumed by the history view.
#[async_trait]
pub trait HistoricalRates: Send + Sync {
    async fn series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        span: Span,
        force_refresh: bool,
    ) -> RateResult<HistoricalSeries>;
}
