use crate::domain::model::{CurrencyPair, RateRecord};
use crate::domain::ports::BlobStorage;
use crate::utils::error::{FxError, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "fxCache_v1";
pub const DEFAULT_TTL: Duration = Duration::from_millis(30 * 60 * 1000);

/// 每筆紀錄個別解碼，單筆損毀不影響其他幣別組合
type CacheStore = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(RateRecord),
    /// 沒有紀錄，或紀錄已過期
    Miss,
    /// 儲存層無法讀取或內容損毀
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheWrite {
    Stored,
    Unavailable(String),
}

/// 以幣別組合為鍵、帶有效期限的匯率快取，整個 store 存成單一 JSON blob
pub struct RateCache<S: BlobStorage> {
    storage: S,
    namespace: String,
    ttl: Duration,
}

impl<S: BlobStorage> RateCache<S> {
    pub fn new(storage: S) -> Self {
        Self::with_settings(storage, DEFAULT_NAMESPACE, DEFAULT_TTL)
    }

    pub fn with_settings(storage: S, namespace: &str, ttl: Duration) -> Self {
        Self {
            storage,
            namespace: namespace.to_string(),
            ttl,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 取得仍在有效期限內的紀錄；任何儲存錯誤都當作找不到
    pub async fn get(&self, from: &str, to: &str) -> Option<RateRecord> {
        match self.lookup(from, to).await {
            CacheLookup::Hit(record) => Some(record),
            CacheLookup::Miss | CacheLookup::Unavailable(_) => None,
        }
    }

    pub async fn lookup(&self, from: &str, to: &str) -> CacheLookup {
        self.lookup_at(from, to, Utc::now()).await
    }

    pub async fn lookup_at(&self, from: &str, to: &str, now: DateTime<Utc>) -> CacheLookup {
        let store = match self.load_store().await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("⚠️ Rate cache unavailable: {}", e);
                return CacheLookup::Unavailable(e.to_string());
            }
        };

        let key = CurrencyPair::new(from, to).cache_key();
        let Some(entry) = store.get(&key) else {
            return CacheLookup::Miss;
        };

        let record = match serde_json::from_value::<RateRecord>(entry.clone()) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Ignoring malformed cache entry {}: {}", key, e);
                return CacheLookup::Miss;
            }
        };

        if !record.is_valid() {
            tracing::debug!("Ignoring cached {} with unusable rate {}", key, record.rate);
            return CacheLookup::Miss;
        }

        let age_ms = now.timestamp_millis() - record.cached_at;
        if age_ms <= self.ttl.as_millis() as i64 {
            tracing::debug!("Cache hit for {} (age {} ms)", key, age_ms);
            CacheLookup::Hit(record)
        } else {
            tracing::debug!("Cache entry for {} is stale (age {} ms)", key, age_ms);
            CacheLookup::Miss
        }
    }

    /// 寫入或覆蓋紀錄；失敗時不回報錯誤，只回傳 `CacheWrite::Unavailable`
    pub async fn set(
        &self,
        from: &str,
        to: &str,
        rate: f64,
        source: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> CacheWrite {
        self.set_at(from, to, rate, source, timestamp, Utc::now())
            .await
    }

    pub async fn set_at(
        &self,
        from: &str,
        to: &str,
        rate: f64,
        source: &str,
        timestamp: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> CacheWrite {
        // 讀取失敗時從空的 store 開始
        let mut store = match self.load_store().await {
            Ok(store) => store,
            Err(e) => {
                tracing::debug!("Starting from an empty rate cache: {}", e);
                CacheStore::new()
            }
        };

        let key = CurrencyPair::new(from, to).cache_key();
        let record = RateRecord {
            rate,
            source: Some(source.to_string()),
            timestamp,
            cached_at: now.timestamp_millis(),
        };
        let entry = match serde_json::to_value(&record) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("⚠️ Failed to encode cache entry {}: {}", key, e);
                return CacheWrite::Unavailable(e.to_string());
            }
        };
        // 其他幣別組合的紀錄原封不動寫回
        store.insert(key.clone(), entry);

        match self.save_store(&store).await {
            Ok(()) => {
                tracing::debug!("Cached {} = {} ({})", key, rate, source);
                CacheWrite::Stored
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to persist rate cache: {}", e);
                CacheWrite::Unavailable(e.to_string())
            }
        }
    }

    async fn load_store(&self) -> Result<CacheStore> {
        match self.storage.read_blob(&self.namespace).await? {
            None => Ok(CacheStore::new()),
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(CacheStore::new()),
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    async fn save_store(&self, store: &CacheStore) -> Result<()> {
        let data = serde_json::to_vec(store).map_err(FxError::SerializationError)?;
        self.storage.write_blob(&self.namespace, &data).await
    }
}
