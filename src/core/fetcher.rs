use crate::domain::model::{is_usable_rate, normalize_code, FetchOutcome, FetchedRate};
use crate::domain::ports::RateProvider;
use crate::utils::error::{FxError, Result};
use chrono::Utc;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// 依固定優先順序逐一嘗試匯率來源，第一個成功者即回傳
pub struct MultiSourceFetcher {
    providers: Vec<Box<dyn RateProvider>>, // 順序即優先順序
    timeout: Duration,
}

impl MultiSourceFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn RateProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn RateProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_labels(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.label()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn fetch(&self, from: &str, to: &str) -> FetchOutcome {
        let from = normalize_code(from);
        let to = normalize_code(to);
        let mut errors = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            tracing::debug!("📡 Trying {} for {}->{}", provider.label(), from, to);

            match self.attempt_with_timeout(provider.as_ref(), &from, &to).await {
                Ok(rate) => {
                    tracing::info!("✅ {}->{} = {} via {}", from, to, rate, provider.label());
                    return FetchOutcome::Fetched(FetchedRate {
                        rate,
                        source: provider.label().to_string(),
                        timestamp: Utc::now(),
                        errors,
                    });
                }
                Err(e) => {
                    tracing::warn!("⚠️ {} failed: {}", provider.label(), e);
                    errors.push(e.to_string());
                }
            }
        }

        tracing::error!(
            "❌ All {} rate sources failed for {}->{}",
            self.providers.len(),
            from,
            to
        );
        FetchOutcome::Failed { errors }
    }

    async fn attempt_with_timeout(
        &self,
        provider: &dyn RateProvider,
        from: &str,
        to: &str,
    ) -> Result<f64> {
        // 逾時會丟棄進行中的 future，等同中止請求
        let rate = tokio::time::timeout(self.timeout, provider.attempt(from, to))
            .await
            .map_err(|_| FxError::TimeoutError {
                provider: provider.label().to_string(),
                millis: self.timeout.as_millis(),
            })??;

        if !is_usable_rate(rate) {
            return Err(FxError::InvalidRateError {
                provider: provider.label().to_string(),
                rate,
            });
        }
        Ok(rate)
    }
}

impl Default for MultiSourceFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}
