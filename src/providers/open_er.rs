//! Latest rates from an open.er-api.com compatible service.

use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, RateResult};
use crate::core::rates::{LatestRateSource, RateTable};
use crate::providers::util::{get_text, normalize_base_url};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

pub struct OpenErProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenErProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        OpenErProvider {
            base_url: normalize_base_url(base_url),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: Option<String>,
    base_code: Option<String>,
    rates: Option<HashMap<String, f64>>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

#[async_trait]
impl LatestRateSource for OpenErProvider {
    #[instrument(name = "LatestRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_latest(&self, base: &CurrencyCode) -> RateResult<RateTable> {
        let url = format!("{}/v6/latest/{}", self.base_url, base);
        let (status, body) = get_text(&self.client, &url).await?;

        let data: LatestResponse = serde_json::from_str(&body).map_err(|e| {
            if (200..300).contains(&status) {
                RateError::InvalidResponse(format!("Failed to parse latest rates for {base}: {e}"))
            } else {
                RateError::InvalidResponse(format!("HTTP error: {status} for base: {base}"))
            }
        })?;

        let result = data.result.as_deref().unwrap_or_default();
        if !result.eq_ignore_ascii_case("success") {
            return Err(match data.error_type.as_deref() {
                Some("unsupported-code") => RateError::UnsupportedBase(base.to_string()),
                Some(other) => RateError::InvalidResponse(other.to_string()),
                None => RateError::InvalidResponse(format!(
                    "Unexpected result '{result}' for base: {base}"
                )),
            });
        }

        let all_rates = data.rates.ok_or_else(|| {
            RateError::InvalidResponse(format!("No rates in response for base: {base}"))
        })?;

        let received_base = data
            .base_code
            .as_deref()
            .and_then(|code| code.parse::<CurrencyCode>().ok())
            .unwrap_or(*base);

        let total = all_rates.len();
        let rates: BTreeMap<CurrencyCode, f64> = all_rates
            .into_iter()
            .filter_map(|(code, rate)| {
                let code = code.parse::<CurrencyCode>().ok()?;
                code.is_live_supported().then_some((code, rate))
            })
            .collect();
        debug!(
            "Kept {} of {} rates for base {}",
            rates.len(),
            total,
            received_base
        );

        Ok(RateTable::new(received_base, rates))
    }
}
