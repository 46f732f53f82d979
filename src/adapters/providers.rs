//! Public FX-rate services, one adapter per response shape.
//!
//! Every adapter issues a plain GET with a `_ts` cache-busting parameter and
//! validates its own payload; anything unexpected becomes a descriptive error
//! so the fetcher can move on to the next source.

use crate::domain::ports::RateProvider;
use crate::utils::error::{FxError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const EXCHANGERATE_HOST_URL: &str = "https://api.exchangerate.host";
pub const OPEN_ER_API_URL: &str = "https://open.er-api.com";
pub const JSDELIVR_CURRENCY_API_URL: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ExchangerateHostConvert,
    ExchangerateHostLatest,
    OpenErApi,
    JsdelivrCurrencyApi,
}

impl ProviderKind {
    /// 預設的嘗試順序
    pub const DEFAULT_ORDER: [ProviderKind; 4] = [
        ProviderKind::ExchangerateHostConvert,
        ProviderKind::ExchangerateHostLatest,
        ProviderKind::OpenErApi,
        ProviderKind::JsdelivrCurrencyApi,
    ];

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::ExchangerateHostConvert | ProviderKind::ExchangerateHostLatest => {
                EXCHANGERATE_HOST_URL
            }
            ProviderKind::OpenErApi => OPEN_ER_API_URL,
            ProviderKind::JsdelivrCurrencyApi => JSDELIVR_CURRENCY_API_URL,
        }
    }

    pub fn build(&self, client: Client, base_url: &str) -> Box<dyn RateProvider> {
        let base_url = base_url.to_string();
        match self {
            ProviderKind::ExchangerateHostConvert => {
                Box::new(ExchangeRateHostConvert { client, base_url })
            }
            ProviderKind::ExchangerateHostLatest => {
                Box::new(ExchangeRateHostLatest { client, base_url })
            }
            ProviderKind::OpenErApi => Box::new(OpenErApi { client, base_url }),
            ProviderKind::JsdelivrCurrencyApi => {
                Box::new(JsdelivrCurrencyApi { client, base_url })
            }
        }
    }
}

fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

fn endpoint(short_name: &str, base_url: &str, segments: &[&str]) -> Result<Url> {
    let invalid = |reason: String| FxError::ProviderRequestError {
        provider: short_name.to_string(),
        reason,
    };

    let mut url = Url::parse(base_url)
        .map_err(|e| invalid(format!("invalid base URL '{}': {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("base URL '{}' cannot take a path", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn get_json(
    client: &Client,
    short_name: &str,
    url: Url,
    query: &[(&str, &str)],
) -> Result<Value> {
    let request_failed = |e: reqwest::Error| FxError::ProviderRequestError {
        provider: short_name.to_string(),
        reason: e.to_string(),
    };

    let ts = cache_buster();
    let response = client
        .get(url)
        .query(query)
        .query(&[("_ts", ts.as_str())])
        .send()
        .await
        .map_err(request_failed)?;

    tracing::debug!("{} responded with {}", short_name, response.status());

    if !response.status().is_success() {
        return Err(FxError::ProviderStatusError {
            provider: short_name.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.json::<Value>().await.map_err(request_failed)
}

fn unexpected_shape(short_name: &str) -> FxError {
    FxError::UnexpectedShapeError {
        provider: short_name.to_string(),
    }
}

/// exchangerate.host `/convert`：直接回傳換算結果
pub struct ExchangeRateHostConvert {
    client: Client,
    base_url: String,
}

impl ExchangeRateHostConvert {
    const SHORT_NAME: &'static str = "host/convert";
}

#[async_trait]
impl RateProvider for ExchangeRateHostConvert {
    fn label(&self) -> &str {
        "exchangerate.host (convert)"
    }

    async fn attempt(&self, from: &str, to: &str) -> Result<f64> {
        let url = endpoint(Self::SHORT_NAME, &self.base_url, &["convert"])?;
        let data = get_json(
            &self.client,
            Self::SHORT_NAME,
            url,
            &[("from", from), ("to", to), ("amount", "1")],
        )
        .await?;

        data.get("result")
            .and_then(Value::as_f64)
            .or_else(|| data.pointer("/info/rate").and_then(Value::as_f64))
            .ok_or_else(|| unexpected_shape(Self::SHORT_NAME))
    }
}

/// exchangerate.host `/latest`：以目標幣別為鍵的 rates 表
pub struct ExchangeRateHostLatest {
    client: Client,
    base_url: String,
}

impl ExchangeRateHostLatest {
    const SHORT_NAME: &'static str = "host/latest";
}

#[async_trait]
impl RateProvider for ExchangeRateHostLatest {
    fn label(&self) -> &str {
        "exchangerate.host (latest)"
    }

    async fn attempt(&self, from: &str, to: &str) -> Result<f64> {
        let url = endpoint(Self::SHORT_NAME, &self.base_url, &["latest"])?;
        let data = get_json(
            &self.client,
            Self::SHORT_NAME,
            url,
            &[("base", from), ("symbols", to)],
        )
        .await?;

        data.get("rates")
            .and_then(|rates| rates.get(to))
            .and_then(Value::as_f64)
            .ok_or_else(|| unexpected_shape(Self::SHORT_NAME))
    }
}

/// open.er-api.com `/v6/latest/{FROM}`
pub struct OpenErApi {
    client: Client,
    base_url: String,
}

impl OpenErApi {
    const SHORT_NAME: &'static str = "er-api";
}

#[async_trait]
impl RateProvider for OpenErApi {
    fn label(&self) -> &str {
        "open.er-api.com"
    }

    async fn attempt(&self, from: &str, to: &str) -> Result<f64> {
        let url = endpoint(Self::SHORT_NAME, &self.base_url, &["v6", "latest", from])?;
        let data = get_json(&self.client, Self::SHORT_NAME, url, &[]).await?;

        if data.get("result").and_then(Value::as_str) != Some("success") {
            return Err(unexpected_shape(Self::SHORT_NAME));
        }
        data.get("rates")
            .and_then(|rates| rates.get(to))
            .and_then(Value::as_f64)
            .ok_or_else(|| unexpected_shape(Self::SHORT_NAME))
    }
}

/// jsdelivr 上的靜態 currency-api，鍵為小寫幣別代碼
pub struct JsdelivrCurrencyApi {
    client: Client,
    base_url: String,
}

impl JsdelivrCurrencyApi {
    const SHORT_NAME: &'static str = "jsdelivr";
}

#[async_trait]
impl RateProvider for JsdelivrCurrencyApi {
    fn label(&self) -> &str {
        "jsdelivr currency-api"
    }

    async fn attempt(&self, from: &str, to: &str) -> Result<f64> {
        let from = from.to_lowercase();
        let to = to.to_lowercase();
        let file_name = format!("{}.json", from);
        let url = endpoint(
            Self::SHORT_NAME,
            &self.base_url,
            &["v1", "currencies", &file_name],
        )?;
        let data = get_json(&self.client, Self::SHORT_NAME, url, &[]).await?;

        data.get(&from)
            .and_then(|table| table.get(&to))
            .and_then(Value::as_f64)
            .ok_or_else(|| unexpected_shape(Self::SHORT_NAME))
    }
}
