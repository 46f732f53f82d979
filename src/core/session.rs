use crate::core::cache::{CacheLookup, CacheWrite, RateCache};
use crate::core::calculator::{calculate, render};
use crate::core::fetcher::MultiSourceFetcher;
use crate::domain::model::{
    CalculationInputs, CalculationResult, CalculationView, CurrencyPair, FetchOutcome,
    RateAttribution, RawInputs,
};
use crate::domain::ports::{BlobStorage, ConfigProvider};

pub const CACHED_RATE_NOTICE: &str = "(Using cached rate)";

/// 本次計算所用匯率的來由
#[derive(Debug, Clone, PartialEq)]
pub enum RateOrigin {
    /// 幣別組合未變或不完整，沿用欄位中現有的匯率
    Present,
    Cached,
    Fetched,
    FetchFailed { errors: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculateOutcome {
    pub view: CalculationView,
    pub result: CalculationResult,
    /// 顯示在匯率欄位下方的提示或錯誤
    pub notice: Option<String>,
    pub rate_origin: RateOrigin,
}

/// 一個頁面工作階段：保存表單欄位、匯率出處與上次成功取得匯率的幣別組合
///
/// `calculate` 需要 `&mut self`，同一個 session 不會有兩個計算同時進行。
pub struct CalculatorSession<S: BlobStorage> {
    fetcher: MultiSourceFetcher,
    cache: RateCache<S>,
    inputs: RawInputs,
    attribution: RateAttribution,
    last_pair: Option<CurrencyPair>,
    notice: Option<String>,
}

impl<S: BlobStorage> CalculatorSession<S> {
    pub fn new(fetcher: MultiSourceFetcher, cache: RateCache<S>) -> Self {
        Self {
            fetcher,
            cache,
            inputs: RawInputs::default(),
            attribution: RateAttribution::Manual,
            last_pair: None,
            notice: None,
        }
    }

    pub fn with_config<C: ConfigProvider>(
        config: &C,
        fetcher: MultiSourceFetcher,
        storage: S,
    ) -> Self {
        let cache = RateCache::with_settings(storage, config.cache_namespace(), config.cache_ttl());
        Self::new(fetcher, cache)
    }

    /// 編輯任一幣別欄位都會讓下次計算重新取得匯率
    pub fn set_currencies(&mut self, old_ccy: &str, new_ccy: &str) {
        self.inputs.old_ccy = old_ccy.to_string();
        self.inputs.new_ccy = new_ccy.to_string();
        self.last_pair = None;
    }

    pub fn set_amounts(&mut self, original: &str, reimbursed: &str) {
        self.inputs.original = original.to_string();
        self.inputs.reimbursed = reimbursed.to_string();
    }

    pub fn set_decimals(&mut self, decimals: &str) {
        self.inputs.decimals = decimals.to_string();
    }

    /// 手動輸入匯率，出處改為 manual entry
    pub fn set_rate(&mut self, rate: &str) {
        self.inputs.rate = rate.to_string();
        self.attribution = RateAttribution::Manual;
    }

    /// 把目前的幣別組合視為已取得匯率（例如匯率已由使用者先行提供）
    pub fn accept_current_pair(&mut self) {
        let pair = CurrencyPair::new(&self.inputs.old_ccy, &self.inputs.new_ccy);
        self.last_pair = pair.is_complete().then_some(pair);
    }

    pub fn inputs(&self) -> &RawInputs {
        &self.inputs
    }

    pub fn attribution(&self) -> &RateAttribution {
        &self.attribution
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// 上次成功取得匯率的幣別組合；`None` 表示需要重新取得
    pub fn pair_state(&self) -> Option<&CurrencyPair> {
        self.last_pair.as_ref()
    }

    pub fn cache(&self) -> &RateCache<S> {
        &self.cache
    }

    pub async fn calculate(&mut self) -> CalculateOutcome {
        self.notice = None;

        let pair = CurrencyPair::new(&self.inputs.old_ccy, &self.inputs.new_ccy);
        let needs_fetch = pair.is_complete() && self.last_pair.as_ref() != Some(&pair);

        let rate_origin = if needs_fetch {
            self.obtain_rate(pair).await
        } else {
            tracing::debug!("Pair unchanged or incomplete, using the rate already present");
            RateOrigin::Present
        };

        let inputs = CalculationInputs::from_raw(&self.inputs);
        CalculateOutcome {
            view: render(&inputs, &self.attribution),
            result: calculate(&inputs),
            notice: self.notice.clone(),
            rate_origin,
        }
    }

    /// 清空所有欄位並回到初始畫面
    pub fn reset(&mut self) -> CalculationView {
        self.inputs = RawInputs::default();
        self.attribution = RateAttribution::Manual;
        self.last_pair = None;
        self.notice = None;
        CalculationView::placeholder()
    }

    async fn obtain_rate(&mut self, pair: CurrencyPair) -> RateOrigin {
        match self.cache.lookup(&pair.from, &pair.to).await {
            CacheLookup::Hit(record) => {
                tracing::info!("💾 Using cached rate for {}: {}", pair, record.rate);
                self.inputs.rate = record.rate.to_string();
                self.attribution = RateAttribution::Sourced {
                    source: record
                        .source
                        .clone()
                        .unwrap_or_else(|| "cached".to_string()),
                    timestamp: record.retrieved_at(),
                };
                self.notice = Some(CACHED_RATE_NOTICE.to_string());
                self.last_pair = Some(pair);
                return RateOrigin::Cached;
            }
            CacheLookup::Miss => {}
            CacheLookup::Unavailable(reason) => {
                tracing::debug!("Cache skipped for {}: {}", pair, reason);
            }
        }

        match self.fetcher.fetch(&pair.from, &pair.to).await {
            FetchOutcome::Fetched(fetched) => {
                if !fetched.errors.is_empty() {
                    tracing::debug!(
                        "Rate from {} after {} failed source(s): {}",
                        fetched.source,
                        fetched.errors.len(),
                        fetched.errors.join(" | ")
                    );
                }
                self.inputs.rate = fetched.rate.to_string();
                self.attribution = RateAttribution::Sourced {
                    source: fetched.source.clone(),
                    timestamp: Some(fetched.timestamp),
                };

                if let CacheWrite::Unavailable(reason) = self
                    .cache
                    .set(
                        &pair.from,
                        &pair.to,
                        fetched.rate,
                        &fetched.source,
                        Some(fetched.timestamp),
                    )
                    .await
                {
                    tracing::debug!("Rate for {} not cached: {}", pair, reason);
                }

                self.last_pair = Some(pair);
                RateOrigin::Fetched
            }
            FetchOutcome::Failed { errors } => {
                self.notice = Some(format!(
                    "Live FX failed. Enter FX manually. Details: {}",
                    errors.join(" | ")
                ));
                self.attribution = RateAttribution::Manual;
                RateOrigin::FetchFailed { errors }
            }
        }
    }
}
