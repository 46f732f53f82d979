use crate::adapters::providers::ProviderKind;
use crate::core::cache::{DEFAULT_NAMESPACE, DEFAULT_TTL};
use crate::core::fetcher::{MultiSourceFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{FxError, Result};
use crate::utils::validation::Validate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CACHE_DIR: &str = ".fx-reimburse";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    pub usage: Option<UsageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub namespace: String,
    pub ttl_ms: u64,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    pub endpoint: String,
    pub secret: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl_ms: DEFAULT_TTL.as_millis() as u64,
            directory: None,
        }
    }
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    ProviderKind::DEFAULT_ORDER
        .iter()
        .map(|kind| ProviderConfig {
            kind: *kind,
            base_url: None,
            enabled: None,
        })
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            providers: default_providers(),
            usage: None,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FxError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FxError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FX_USAGE_SECRET})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FxError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_positive_number("fetch.timeout_ms", self.fetch.timeout_ms, 1)?;
        validate_positive_number("cache.ttl_ms", self.cache.ttl_ms, 1)?;
        validate_file_name("cache.namespace", &self.cache.namespace)?;
        if let Some(directory) = &self.cache.directory {
            validate_non_empty_string("cache.directory", directory)?;
        }

        if !self.providers.iter().any(ProviderConfig::is_enabled) {
            return Err(FxError::ConfigValidationError {
                field: "providers".to_string(),
                message: "At least one rate provider must be enabled".to_string(),
            });
        }
        for provider in &self.providers {
            validate_url("providers.base_url", provider.base_url())?;
        }

        if let Some(usage) = &self.usage {
            validate_url("usage.endpoint", &usage.endpoint)?;
        }

        Ok(())
    }

    /// 依設定的順序建立匯率來源鏈（略過停用的來源）
    pub fn build_fetcher(&self, client: Client) -> MultiSourceFetcher {
        self.providers
            .iter()
            .filter(|provider| provider.is_enabled())
            .fold(
                MultiSourceFetcher::new(self.fetch_timeout()),
                |fetcher, provider| {
                    fetcher.with_provider(provider.kind.build(client.clone(), provider.base_url()))
                },
            )
    }

    pub fn cache_directory(&self) -> &str {
        self.cache.directory.as_deref().unwrap_or(DEFAULT_CACHE_DIR)
    }
}

impl ConfigProvider for AppConfig {
    fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch.timeout_ms)
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.ttl_ms)
    }

    fn cache_namespace(&self) -> &str {
        &self.cache.namespace
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
