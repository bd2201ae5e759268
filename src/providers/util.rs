use crate::core::error::{RateError, RateResult};
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "devise/0.1";

/// Builds the shared HTTP client. Connect and read share one timeout; a
/// timeout surfaces as [`RateError::Network`].
pub fn build_client(timeout: Duration) -> RateResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| RateError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Issues a GET and returns the status and body text.
pub async fn get_text(client: &reqwest::Client, url: &str) -> RateResult<(u16, String)> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RateError::from_transport(&e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RateError::from_transport(&e))?;
    debug!(status = status.as_u16(), "Received response from {}", url);
    Ok((status.as_u16(), body))
}

/// Trims a trailing slash so paths can be appended with `format!`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
