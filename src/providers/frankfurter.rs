//! Historical time series from a Frankfurter compatible service.

use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, RateResult};
use crate::core::rates::{HistoricalSeries, SeriesRateSource, Span};
use crate::providers::util::{get_text, normalize_base_url};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        FrankfurterProvider {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    /// Fetches the series ending on `today`.
    pub async fn fetch_series_until(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        span: Span,
        today: NaiveDate,
    ) -> RateResult<HistoricalSeries> {
        let (start, end) = span.date_range(today);
        let url = format!(
            "{}/v1/{}..{}?base={}&symbols={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            base,
            target
        );
        let (status, body) = get_text(&self.client, &url).await?;
        if !(200..300).contains(&status) {
            return Err(RateError::InvalidResponse(format!(
                "HTTP error: {status} for series {base}/{target}"
            )));
        }

        let data: TimeSeriesResponse = serde_json::from_str(&body).map_err(|e| {
            RateError::InvalidResponse(format!(
                "Failed to parse series for {base}/{target}: {e}"
            ))
        })?;
        let rates = data.rates.ok_or_else(|| {
            RateError::InvalidResponse(format!("No rates in series for {base}/{target}"))
        })?;

        let points = flatten_series(rates, target);
        debug!(
            "Series {}/{} from {:?} to {:?}: {} points",
            base,
            target,
            data.start_date,
            data.end_date,
            points.len()
        );

        Ok(HistoricalSeries {
            base: *base,
            target: *target,
            span,
            points,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    start_date: Option<String>,
    end_date: Option<String>,
    rates: Option<HashMap<String, HashMap<String, f64>>>,
}

/// Turns `date -> {code -> rate}` into ascending `(date, rate)` for `target`.
/// Dates that cannot be parsed or lack the target are skipped.
fn flatten_series(
    rates: HashMap<String, HashMap<String, f64>>,
    target: &CurrencyCode,
) -> Vec<(NaiveDate, f64)> {
    let ordered: BTreeMap<NaiveDate, f64> = rates
        .into_iter()
        .filter_map(|(date, per_currency)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
            let rate = per_currency.get(target.as_str()).copied()?;
            Some((date, rate))
        })
        .collect();
    ordered.into_iter().collect()
}

#[async_trait]
impl SeriesRateSource for FrankfurterProvider {
    #[instrument(
        name = "SeriesFetch",
        skip(self),
        fields(base = %base, target = %target, span = %span)
    )]
    async fn fetch_series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        span: Span,
    ) -> RateResult<HistoricalSeries> {
        self.fetch_series_until(base, target, span, Utc::now().date_naive())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::util::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn provider(server: &MockServer) -> FrankfurterProvider {
        FrankfurterProvider::new(
            &server.uri(),
            build_client(Duration::from_secs(5)).unwrap(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[tokio::test]
    async fn test_successful_series_fetch() {
        let mock_server = MockServer::start().await;
        let body = r#"{
            "amount": 1.0,
            "base": "EUR",
            "start_date": "2024-07-01",
            "end_date": "2025-06-30",
            "rates": {
                "2025-06-30": {"USD": 1.17},
                "2024-07-01": {"USD": 1.07},
                "2024-12-31": {"USD": 1.04},
                "2025-01-02": {}
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/v1/2024-06-30..2025-06-30"))
            .and(query_param("base", "EUR"))
            .and(query_param("symbols", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let series = provider(&mock_server)
            .fetch_series_until(&code("EUR"), &code("USD"), Span::OneYear, today())
            .await
            .unwrap();

        assert_eq!(series.base, code("EUR"));
        assert_eq!(series.target, code("USD"));
        assert_eq!(series.span, Span::OneYear);
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(
            series.points,
            vec![
                (d(2024, 7, 1), 1.07),
                (d(2024, 12, 31), 1.04),
                (d(2025, 6, 30), 1.17)
            ]
        );
    }

    #[tokio::test]
    async fn test_fifteen_year_range() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/2010-06-30..2025-06-30"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"rates": {}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let series = provider(&mock_server)
            .fetch_series_until(&code("USD"), &code("JPY"), Span::FifteenYears, today())
            .await
            .unwrap();
        assert!(series.points.is_empty());
    }

    #[tokio::test]
    async fn test_missing_rates_is_invalid_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"base": "EUR"}"#))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server)
            .fetch_series_until(&code("EUR"), &code("USD"), Span::OneYear, today())
            .await;
        assert_eq!(
            result,
            Err(RateError::InvalidResponse(
                "No rates in series for EUR/USD".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"not found"}"#))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server)
            .fetch_series_until(&code("EUR"), &code("USD"), Span::FiveYears, today())
            .await;
        assert_eq!(
            result,
            Err(RateError::InvalidResponse(
                "HTTP error: 404 for series EUR/USD".to_string()
            ))
        );
    }

    #[test]
    fn test_flatten_skips_bad_dates() {
        let rates = HashMap::from([
            (
                "2024-01-02".to_string(),
                HashMap::from([("USD".to_string(), 1.1)]),
            ),
            (
                "not-a-date".to_string(),
                HashMap::from([("USD".to_string(), 9.9)]),
            ),
        ]);
        let points = flatten_series(rates, &code("USD"));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].1, 1.1);
    }
}
