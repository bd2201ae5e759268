//! Error taxonomy for rate acquisition and conversion.

use thiserror::Error;

/// Errors surfaced by the rate sources, the caches and the conversion engine.
///
/// Cache persistence failures never show up here: they are logged and
/// swallowed by the cache layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Transport failure or timeout. Retryable by the user.
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream payload was malformed or reported a failure.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The live rate service does not accept this base currency.
    #[error("Unsupported base currency: {0}")]
    UnsupportedBase(String),

    /// The pair is outside the set supported for historical rates.
    #[error("Unsupported currency pair for history: {base}/{target}")]
    UnsupportedCurrency { base: String, target: String },

    /// The rate table has no entry for this code.
    #[error("Unknown currency in rate table: {0}")]
    UnknownCurrency(String),

    /// Historical rates are namespaced per user and no user is signed in.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Text that is not a three letter currency code.
    #[error("Invalid currency code: {0}")]
    InvalidCode(String),

    /// Lookback window other than 1, 5 or 15 years.
    #[error("Unsupported history period: {0} years")]
    UnsupportedSpan(u32),
}

impl RateError {
    /// Maps a reqwest failure to the taxonomy. Body decoding errors are
    /// upstream problems, everything else is transport.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            RateError::InvalidResponse(err.to_string())
        } else if err.is_timeout() {
            RateError::Network(format!("request timed out: {err}"))
        } else {
            RateError::Network(err.to_string())
        }
    }
}

pub type RateResult<T> = std::result::Result<T, RateError>;
