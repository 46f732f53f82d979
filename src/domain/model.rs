use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 有方向的幣別組合，代碼一律轉為大寫
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: normalize_code(from),
            to: normalize_code(to),
        }
    }

    /// 兩個代碼都有值時才算完整的組合
    pub fn is_complete(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty()
    }

    pub fn cache_key(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// 快取中保存的匯率紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecord {
    pub rate: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// 寫入快取的時間（Unix epoch 毫秒）
    pub cached_at: i64,
}

impl RateRecord {
    pub fn is_valid(&self) -> bool {
        is_usable_rate(self.rate)
    }

    /// 取得時間：沒有原始取得時間時退回寫入快取的時間
    pub fn retrieved_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .or_else(|| DateTime::<Utc>::from_timestamp_millis(self.cached_at))
    }
}

/// 成功從匯率來源取得的結果
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRate {
    pub rate: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    /// 成功之前失敗的來源錯誤訊息，依嘗試順序
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(FetchedRate),
    /// 所有來源都失敗，依嘗試順序保留每個來源的錯誤訊息
    Failed { errors: Vec<String> },
}

impl FetchOutcome {
    pub fn rate(&self) -> Option<f64> {
        match self {
            FetchOutcome::Fetched(fetched) => Some(fetched.rate),
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn errors(&self) -> &[String] {
        match self {
            FetchOutcome::Fetched(fetched) => &fetched.errors,
            FetchOutcome::Failed { errors } => errors,
        }
    }
}

/// 匯率欄位目前數值的出處
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RateAttribution {
    #[default]
    Manual,
    Sourced {
        source: String,
        timestamp: Option<DateTime<Utc>>,
    },
}

impl RateAttribution {
    pub fn label(&self) -> &str {
        match self {
            RateAttribution::Manual => "manual entry",
            RateAttribution::Sourced { source, .. } => source,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            RateAttribution::Manual => None,
            RateAttribution::Sourced { timestamp, .. } => *timestamp,
        }
    }
}

/// 表單原始輸入（皆為自由文字）
#[derive(Debug, Clone, PartialEq)]
pub struct RawInputs {
    pub old_ccy: String,
    pub new_ccy: String,
    pub original: String,
    pub reimbursed: String,
    pub rate: String,
    pub decimals: String,
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            old_ccy: String::new(),
            new_ccy: String::new(),
            original: String::new(),
            reimbursed: String::new(),
            rate: String::new(),
            decimals: "2".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationInputs {
    pub original: f64,
    pub reimbursed: f64,
    pub rate: f64,
    pub decimals: usize,
    /// 已轉大寫，可能為空字串
    pub old_ccy: String,
    pub new_ccy: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationResult {
    pub remaining_old: f64,
    pub remaining_new: f64,
    pub hybrid_total: f64,
}

/// UI 要顯示的文字
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationView {
    pub remaining_old: String,
    pub remaining_new: String,
    pub hybrid_total: String,
    pub hybrid_tag: String,
    pub old_ccy_tag: String,
    pub new_ccy_tag: String,
    pub description: String,
}

pub const EMPTY_DISPLAY: &str = "—";

impl CalculationView {
    /// 重設後的初始畫面
    pub fn placeholder() -> Self {
        Self {
            remaining_old: EMPTY_DISPLAY.to_string(),
            remaining_new: EMPTY_DISPLAY.to_string(),
            hybrid_total: EMPTY_DISPLAY.to_string(),
            hybrid_tag: String::new(),
            old_ccy_tag: "OLD".to_string(),
            new_ccy_tag: "NEW".to_string(),
            description: EMPTY_DISPLAY.to_string(),
        }
    }
}

pub fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
