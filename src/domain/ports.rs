use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 以 namespace 為鍵的整塊資料存取（相當於瀏覽器的 localStorage）
pub trait BlobStorage: Send + Sync {
    /// 不存在時回傳 `Ok(None)`
    fn read_blob(
        &self,
        namespace: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_blob(
        &self,
        namespace: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 單一匯率來源
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// 顯示於說明文字中的來源名稱
    fn label(&self) -> &str;

    async fn attempt(&self, from: &str, to: &str) -> Result<f64>;
}

pub trait ConfigProvider: Send + Sync {
    fn fetch_timeout(&self) -> Duration;
    fn cache_ttl(&self) -> Duration;
    fn cache_namespace(&self) -> &str;
}
