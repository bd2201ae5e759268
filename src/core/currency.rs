//! Currency codes and the per-source support sets.

use crate::core::error::RateError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Codes accepted from the live rate service, in display order.
pub const LIVE_CURRENCIES: [&str; 30] = [
    "EUR", "USD", "GBP", "CHF", "CAD", "AUD", "JPY", "CNY", "BRL", "NOK", "SEK", "DKK", "THB",
    "INR", "KRW", "MXN", "SGD", "HKD", "NZD", "ZAR", "TRY", "PLN", "CZK", "HUF", "RON", "ILS",
    "PHP", "MYR", "IDR", "ISK",
];

/// Codes the historical time-series service can answer for.
pub const HISTORICAL_CURRENCIES: [&str; 31] = [
    "EUR", "USD", "GBP", "CHF", "CAD", "JPY", "AUD", "CNY", "BRL", "NOK", "BGN", "CZK", "DKK",
    "HUF", "PLN", "RON", "SEK", "ISK", "TRY", "ZAR", "HKD", "IDR", "ILS", "INR", "KRW", "MXN",
    "MYR", "NZD", "PHP", "SGD", "THB",
];

const NAMES: [(&str, &str); 31] = [
    ("EUR", "Euro"),
    ("USD", "US Dollar"),
    ("GBP", "Pound Sterling"),
    ("CHF", "Swiss Franc"),
    ("CAD", "Canadian Dollar"),
    ("AUD", "Australian Dollar"),
    ("JPY", "Japanese Yen"),
    ("CNY", "Chinese Yuan"),
    ("BRL", "Brazilian Real"),
    ("NOK", "Norwegian Krone"),
    ("SEK", "Swedish Krona"),
    ("DKK", "Danish Krone"),
    ("THB", "Thai Baht"),
    ("INR", "Indian Rupee"),
    ("KRW", "South Korean Won"),
    ("MXN", "Mexican Peso"),
    ("SGD", "Singapore Dollar"),
    ("HKD", "Hong Kong Dollar"),
    ("NZD", "New Zealand Dollar"),
    ("ZAR", "South African Rand"),
    ("TRY", "Turkish Lira"),
    ("PLN", "Polish Zloty"),
    ("CZK", "Czech Koruna"),
    ("HUF", "Hungarian Forint"),
    ("RON", "Romanian Leu"),
    ("ILS", "Israeli Shekel"),
    ("PHP", "Philippine Peso"),
    ("MYR", "Malaysian Ringgit"),
    ("IDR", "Indonesian Rupiah"),
    ("ISK", "Icelandic Krona"),
    ("BGN", "Bulgarian Lev"),
];

/// A three letter uppercase currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    pub fn is_live_supported(&self) -> bool {
        LIVE_CURRENCIES.contains(&self.as_str())
    }

    pub fn is_historical_supported(&self) -> bool {
        HISTORICAL_CURRENCIES.contains(&self.as_str())
    }

    pub fn display_name(&self) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(code, _)| *code == self.as_str())
            .map(|(_, name)| *name)
    }
}

impl FromStr for CurrencyCode {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(RateError::InvalidCode(s.to_string()));
        }
        let mut code = [0u8; 3];
        for (slot, b) in code.iter_mut().zip(bytes) {
            *slot = b.to_ascii_uppercase();
        }
        Ok(CurrencyCode(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The live-supported codes in display order.
pub fn live_currencies() -> Vec<CurrencyCode> {
    LIVE_CURRENCIES
        .iter()
        .filter_map(|code| code.parse().ok())
        .collect()
}

/// Both codes must be in the historical set.
pub fn is_historical_pair(base: &CurrencyCode, target: &CurrencyCode) -> bool {
    base.is_historical_supported() && target.is_historical_supported()
}
