use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

mod test_utils {
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LATEST_EUR: &str = r#"{
        "result": "success",
        "base_code": "EUR",
        "rates": {"EUR": 1, "USD": 1.1, "GBP": 0.85, "XAU": 0.0004}
    }"#;

    pub async fn create_latest_mock_server(
        base: &str,
        status: u16,
        body: &str,
        expected_calls: u64,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v6/latest/{base}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_series_mock_server(
        base: &str,
        target: &str,
        body: &str,
        expected_calls: u64,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v1/\d{4}-\d{2}-\d{2}\.\.\d{4}-\d{2}-\d{2}$"))
            .and(query_param("base", base))
            .and(query_param("symbols", target))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }
}

/// Nothing listens here; used for the source a test does not exercise.
const UNUSED_URL: &str = "http://127.0.0.1:9";

fn write_config(dir: &Path, latest_url: &str, series_url: &str, user_id: Option<&str>) -> PathBuf {
    let config_path = dir.join("config.yaml");
    let user_line = user_id
        .map(|id| format!("user_id: \"{id}\""))
        .unwrap_or_default();
    let config_content = format!(
        r#"
currency: "EUR"
target_currency: "USD"
{user_line}
providers:
  exchange_rate:
    base_url: {latest_url}
  frankfurter:
    base_url: {series_url}
cache:
  ttl_hours: 24
http:
  timeout_secs: 5
data_path: "{}"
"#,
        dir.join("data").display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

fn convert(amount: &str, edit_target: bool) -> devise::AppCommand {
    devise::AppCommand::Convert {
        amount: amount.to_string(),
        from: Some("EUR".to_string()),
        to: Some("USD".to_string()),
        edit_target,
        refresh: false,
    }
}

#[test_log::test(tokio::test)]
async fn test_convert_flow_uses_persistent_cache() {
    let mock_server =
        test_utils::create_latest_mock_server("EUR", 200, test_utils::LATEST_EUR, 1).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);
    let config_path = config_path.to_str().unwrap();

    let result = devise::run_command(convert("100", false), Some(config_path)).await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());

    // A second process run within the TTL is served from disk
    let result = devise::run_command(convert("55", true), Some(config_path)).await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_convert_services_end_to_end() {
    use devise::cli::convert::{ConvertArgs, run};

    let mock_server =
        test_utils::create_latest_mock_server("EUR", 200, test_utils::LATEST_EUR, 1).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);
    let config = devise::core::config::AppConfig::load_from_path(&config_path).unwrap();
    let services = devise::build_services(config).unwrap();

    let view = run(
        &services,
        ConvertArgs {
            amount: "100",
            from: None,
            to: None,
            edit_target: false,
            refresh: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(view.to_amount, "110.0");

    let view = run(
        &services,
        ConvertArgs {
            amount: "55",
            from: Some("eur"),
            to: Some("usd"),
            edit_target: true,
            refresh: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(view.from_amount, "50.0");

    // Cross rate through the EUR table
    let view = run(
        &services,
        ConvertArgs {
            amount: "1,5",
            from: None,
            to: Some("GBP"),
            edit_target: false,
            refresh: false,
        },
    )
    .await
    .unwrap();
    let gbp: f64 = view.to_amount.parse().unwrap();
    assert!((gbp - 1.275).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_refresh_bypasses_cache() {
    let mock_server =
        test_utils::create_latest_mock_server("EUR", 200, test_utils::LATEST_EUR, 2).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);
    let config_path = config_path.to_str().unwrap();

    devise::run_command(
        devise::AppCommand::Rates {
            base: None,
            refresh: false,
        },
        Some(config_path),
    )
    .await
    .unwrap();
    devise::run_command(
        devise::AppCommand::Rates {
            base: None,
            refresh: true,
        },
        Some(config_path),
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_cache_clear_forces_refetch() {
    let mock_server =
        test_utils::create_latest_mock_server("EUR", 200, test_utils::LATEST_EUR, 2).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);
    let config_path = config_path.to_str().unwrap();

    devise::run_command(convert("1", false), Some(config_path))
        .await
        .unwrap();
    devise::run_command(devise::AppCommand::ClearCache, Some(config_path))
        .await
        .unwrap();
    devise::run_command(convert("1", false), Some(config_path))
        .await
        .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_unsupported_base_makes_no_request() {
    let mock_server = test_utils::create_latest_mock_server("XAU", 200, "{}", 0).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);

    let result = devise::run_command(
        devise::AppCommand::Rates {
            base: Some("XAU".to_string()),
            refresh: false,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let err = result.unwrap_err();
    assert!(
        format!("{err:#}").contains("Unsupported base currency: XAU"),
        "unexpected error: {err:#}"
    );
}

#[test_log::test(tokio::test)]
async fn test_upstream_failure_is_reported() {
    let mock_server = test_utils::create_latest_mock_server("EUR", 500, "", 1).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), UNUSED_URL, None);

    let err = devise::run_command(convert("10", false), Some(config_path.to_str().unwrap()))
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Conversion failed"), "{message}");
    assert!(message.contains("HTTP error: 500 for base: EUR"), "{message}");
}

#[test_log::test(tokio::test)]
async fn test_history_flow_with_mock() {
    let body = r#"{
        "base": "EUR",
        "start_date": "2024-01-02",
        "end_date": "2024-01-04",
        "rates": {
            "2024-01-02": {"USD": 1.09},
            "2024-01-03": {"USD": 1.10},
            "2024-01-04": {"USD": 1.12}
        }
    }"#;
    let mock_server = test_utils::create_series_mock_server("EUR", "USD", body, 1).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), UNUSED_URL, &mock_server.uri(), Some("u-1"));
    let config = devise::core::config::AppConfig::load_from_path(&config_path).unwrap();
    let services = devise::build_services(config).unwrap();

    let series = devise::cli::history::run(&services, "EUR", "USD", 5, false)
        .await
        .unwrap();
    assert_eq!(series.points.len(), 3);
    assert_eq!(series.span, devise::core::Span::FiveYears);
    assert!((series.change_percent().unwrap() - 2.752293577981651).abs() < 1e-9);

    // Served from the per-user cache
    let cached = devise::cli::history::run(&services, "EUR", "USD", 5, false)
        .await
        .unwrap();
    assert_eq!(cached, series);
}

#[test_log::test(tokio::test)]
async fn test_history_requires_identity() {
    let mock_server = test_utils::create_series_mock_server("EUR", "USD", "{}", 0).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), UNUSED_URL, &mock_server.uri(), None);

    let err = devise::run_command(
        devise::AppCommand::History {
            base: "EUR".to_string(),
            target: "USD".to_string(),
            years: 1,
            refresh: false,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("User not authenticated"));
}

#[test_log::test(tokio::test)]
async fn test_history_rejects_unsupported_pair_and_period() {
    let mock_server = test_utils::create_series_mock_server("EUR", "XAU", "{}", 0).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), UNUSED_URL, &mock_server.uri(), Some("u-1"));
    let config_path = config_path.to_str().unwrap();

    let history = |target: &str, years| devise::AppCommand::History {
        base: "EUR".to_string(),
        target: target.to_string(),
        years,
        refresh: false,
    };

    let err = devise::run_command(history("XAU", 1), Some(config_path))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Unsupported currency pair for history: EUR/XAU"));

    let err = devise::run_command(history("USD", 3), Some(config_path))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Unsupported history period: 3 years"));
}

#[test_log::test(tokio::test)]
async fn test_currencies_and_invalid_code() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = write_config(temp_dir.path(), UNUSED_URL, UNUSED_URL, None);
    let config_path = config_path.to_str().unwrap();

    devise::run_command(devise::AppCommand::Currencies, Some(config_path))
        .await
        .unwrap();

    let err = devise::run_command(
        devise::AppCommand::Convert {
            amount: "1".to_string(),
            from: Some("EURO".to_string()),
            to: None,
            edit_target: false,
            refresh: false,
        },
        Some(config_path),
    )
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("Invalid currency code: EURO"));
}

#[test_log::test(tokio::test)]
#[ignore = "requires network access"]
async fn test_real_open_er_api() {
    use devise::core::rates::LatestRateSource;
    use devise::providers::OpenErProvider;
    use devise::providers::util::build_client;

    let client = build_client(std::time::Duration::from_secs(30)).unwrap();
    let provider = OpenErProvider::new("https://open.er-api.com", client);
    let base: devise::core::CurrencyCode = "EUR".parse().unwrap();
    info!(%base, "Fetching latest rates from open.er-api.com");

    match provider.fetch_latest(&base).await {
        Ok(table) => {
            info!(rates = table.rates.len(), "Received latest rates");
            assert_eq!(table.base, base);
            assert!(table.rate(&"USD".parse().unwrap()).is_some_and(|r| r > 0.0));
            assert!(table.rates.keys().all(|code| code.is_live_supported()));
        }
        Err(e) => {
            error!("Latest rates request failed: {e}\n{e:?}");
            panic!("Latest rates request failed: {e}");
        }
    }
}
