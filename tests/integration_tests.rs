use fx_reimburse::{AppConfig, CalculatorSession, LocalStorage, RateCache, RateOrigin};
use httpmock::prelude::*;
use reqwest::Client;
use tempfile::TempDir;

fn config_for(server: &MockServer) -> AppConfig {
    let toml_content = format!(
        r#"
[fetch]
timeout_ms = 2000

[[providers]]
kind = "exchangerate_host_convert"
base_url = "{base}"

[[providers]]
kind = "exchangerate_host_latest"
base_url = "{base}"

[[providers]]
kind = "open_er_api"
base_url = "{base}"

[[providers]]
kind = "jsdelivr_currency_api"
base_url = "{base}/cdn"
"#,
        base = server.base_url()
    );
    AppConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_end_to_end_fallback_and_persistent_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let convert_mock = server.mock(|when, then| {
        when.method(GET).path("/convert");
        then.status(500);
    });
    let latest_mock = server.mock(|when, then| {
        when.method(GET).path("/latest");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"success": false}));
    });
    let er_api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v6/latest/USD")
            .query_param_exists("_ts");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"result": "success", "rates": {"EUR": 0.9}}));
    });
    let jsdelivr_mock = server.mock(|when, then| {
        when.method(GET).path("/cdn/v1/currencies/usd.json");
        then.status(200)
            .json_body(serde_json::json!({"usd": {"eur": 0.95}}));
    });

    let config = config_for(&server);
    let mut session = CalculatorSession::with_config(
        &config,
        config.build_fetcher(Client::new()),
        LocalStorage::new(cache_dir.clone()),
    );
    session.set_currencies("usd", "eur");
    session.set_amounts("1000", "400");
    session.set_decimals("2");

    let outcome = session.calculate().await;

    convert_mock.assert();
    latest_mock.assert();
    er_api_mock.assert();
    jsdelivr_mock.assert_hits(0);

    assert_eq!(outcome.rate_origin, RateOrigin::Fetched);
    assert_eq!(outcome.view.remaining_old, "600.00 USD");
    assert_eq!(outcome.view.remaining_new, "540.00 EUR");
    assert_eq!(outcome.view.hybrid_total, "940.00");
    for needle in ["1,000.00 USD", "400.00 USD", "600.00 USD", "540.00 EUR", "940.00"] {
        assert!(outcome.view.description.contains(needle), "missing {}", needle);
    }
    assert!(outcome
        .view
        .description
        .contains("FX rate powered by open.er-api.com (retrieved at "));

    // Cache file written in the browser-compatible layout
    let blob = std::fs::read(temp_dir.path().join("fxCache_v1.json")).unwrap();
    let store: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    assert_eq!(store["USD->EUR"]["rate"], 0.9);
    assert_eq!(store["USD->EUR"]["source"], "open.er-api.com");
    assert!(store["USD->EUR"]["cachedAt"].is_i64());

    // A fresh session reuses the persisted rate without touching the network
    let mut second = CalculatorSession::with_config(
        &config,
        config.build_fetcher(Client::new()),
        LocalStorage::new(cache_dir.clone()),
    );
    second.set_currencies("USD", "EUR");
    second.set_amounts("1000", "400");
    let cached = second.calculate().await;

    assert_eq!(cached.rate_origin, RateOrigin::Cached);
    assert_eq!(cached.notice.as_deref(), Some("(Using cached rate)"));
    assert_eq!(cached.view.remaining_new, "540.00 EUR");
    er_api_mock.assert_hits(1);
}

#[tokio::test]
async fn test_end_to_end_total_failure() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(GET);
        then.status(503);
    });

    let config = config_for(&server);
    let mut session = CalculatorSession::with_config(
        &config,
        config.build_fetcher(Client::new()),
        LocalStorage::new(cache_dir),
    );
    session.set_currencies("USD", "EUR");
    session.set_amounts("1000", "400");

    let outcome = session.calculate().await;

    any_mock.assert_hits(4);
    assert_eq!(
        outcome.notice.as_deref(),
        Some("Live FX failed. Enter FX manually. Details: host/convert HTTP 503 | host/latest HTTP 503 | er-api HTTP 503 | jsdelivr HTTP 503")
    );
    assert_eq!(outcome.view.remaining_old, "600.00 USD");
    assert_eq!(outcome.view.remaining_new, "—");
    assert_eq!(outcome.view.hybrid_total, "400.00");
    assert!(session.pair_state().is_none());

    // Nothing was cached
    assert!(!temp_dir.path().join("fxCache_v1.json").exists());
}

#[tokio::test]
async fn test_corrupt_cache_file_is_recovered() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("fxCache_v1.json"), b"{\"USD->EUR\": oops").unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let cache = RateCache::new(storage);

    assert!(cache.get("USD", "EUR").await.is_none());

    cache.set("USD", "EUR", 0.9, "open.er-api.com", None).await;
    let record = cache.get("USD", "EUR").await.unwrap();
    assert_eq!(record.rate, 0.9);
}
