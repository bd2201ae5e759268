use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://open.er-api.com";
pub const DEFAULT_FRANKFURTER_URL: &str = "https://api.frankfurter.dev";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: ProviderConfig,
    #[serde(default = "default_frankfurter")]
    pub frankfurter: ProviderConfig,
}

fn default_exchange_rate() -> ProviderConfig {
    ProviderConfig {
        base_url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
    }
}

fn default_frankfurter() -> ProviderConfig {
    ProviderConfig {
        base_url: DEFAULT_FRANKFURTER_URL.to_string(),
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rate: default_exchange_rate(),
            frankfurter: default_frankfurter(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_currency() -> CurrencyCode {
    CurrencyCode::EUR
}

fn default_target_currency() -> CurrencyCode {
    CurrencyCode::USD
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Default source currency.
    #[serde(default = "default_currency")]
    pub currency: CurrencyCode,
    #[serde(default = "default_target_currency")]
    pub target_currency: CurrencyCode,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Namespaces the historical cache. Without it history is unavailable.
    pub user_id: Option<String>,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            target_currency: default_target_currency(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            user_id: None,
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "devise", "devise")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "devise", "devise")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache.ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "gbp"
target_currency: JPY
user_id: "user-42"
providers:
  exchange_rate:
    base_url: "http://example.com/er"
  frankfurter:
    base_url: "http://example.com/fx"
cache:
  ttl_hours: 6
http:
  timeout_secs: 10
data_path: "/tmp/devise"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency.as_str(), "GBP");
        assert_eq!(config.target_currency.as_str(), "JPY");
        assert_eq!(config.user_id.as_deref(), Some("user-42"));
        assert_eq!(
            config.providers.exchange_rate.base_url,
            "http://example.com/er"
        );
        assert_eq!(config.providers.frankfurter.base_url, "http://example.com/fx");
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(6));
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/devise")
        );
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config: AppConfig = serde_yaml::from_str("user_id: u1\n").unwrap();
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert_eq!(config.target_currency, CurrencyCode::USD);
        assert_eq!(config.providers, ProvidersConfig::default());
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.data_path.is_none());

        let partial: AppConfig = serde_yaml::from_str(
            "providers:\n  frankfurter:\n    base_url: http://localhost:1\n",
        )
        .unwrap();
        assert_eq!(
            partial.providers.exchange_rate.base_url,
            DEFAULT_EXCHANGE_RATE_URL
        );
        assert_eq!(partial.providers.frankfurter.base_url, "http://localhost:1");
    }

    #[test]
    fn test_invalid_currency_is_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("currency: EURO\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config: AppConfig =
            serde_yaml::from_str(include_str!("../../docs/example_config.yaml")).unwrap();
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert_eq!(config.providers, ProvidersConfig::default());
    }

    #[test]
    fn test_load_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from_path(dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
