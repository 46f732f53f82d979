use crate::utils::error::Result;
use reqwest::Client;
use serde_json::Value;

/// 全域使用次數計數器（遙測用途，所有錯誤一律吞掉）
#[derive(Debug, Clone)]
pub struct UsageCounter {
    client: Client,
    endpoint: String,
    secret: Option<String>,
}

impl UsageCounter {
    pub fn new(endpoint: String, secret: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, secret)
    }

    pub fn with_client(client: Client, endpoint: String, secret: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            // 空字串等同未設定
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub async fn fetch_count(&self) -> Option<u64> {
        let request = self.client.get(&self.endpoint);
        self.send(request).await
    }

    pub async fn bump(&self) -> Option<u64> {
        let mut request = self.client.post(&self.endpoint);
        let body = match &self.secret {
            Some(secret) => {
                request = request.query(&[("secret", secret.as_str())]);
                serde_json::json!({ "secret": secret })
            }
            None => serde_json::json!({}),
        };
        self.send(request.json(&body)).await
    }

    /// 記錄一次使用並回傳最新次數；遞增被拒時改為只讀取目前次數
    pub async fn record_use(&self) -> Option<u64> {
        match self.bump().await {
            Some(count) => Some(count),
            None => self.fetch_count().await,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Option<u64> {
        match self.request_count(request).await {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("Usage counter unavailable: {}", e);
                None
            }
        }
    }

    async fn request_count(&self, request: reqwest::RequestBuilder) -> Result<Option<u64>> {
        let body: Value = request.send().await?.error_for_status()?.json().await?;
        Ok(body.get("count").and_then(Value::as_u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FxError;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_count() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200).json_body(serde_json::json!({"count": 1234}));
        });

        let counter = UsageCounter::new(server.url("/exec"), None);

        assert_eq!(counter.fetch_count().await, Some(1234));
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_bump_sends_secret_in_query_and_body() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/exec")
                .query_param("secret", "s3cret")
                .json_body(serde_json::json!({"secret": "s3cret"}));
            then.status(200).json_body(serde_json::json!({"count": 1235}));
        });

        let counter = UsageCounter::new(server.url("/exec"), Some("s3cret".to_string()));

        assert_eq!(counter.bump().await, Some(1235));
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_bump_without_secret_posts_empty_object() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/exec")
                .json_body(serde_json::json!({}));
            then.status(200).json_body(serde_json::json!({"count": 7}));
        });

        let counter = UsageCounter::new(server.url("/exec"), Some(String::new()));

        assert_eq!(counter.bump().await, Some(7));
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200).body("not json");
        });

        let counter = UsageCounter::new(server.url("/exec"), None);
        assert_eq!(counter.fetch_count().await, None);

        let unreachable = UsageCounter::new("http://127.0.0.1:1/exec".to_string(), None);
        assert_eq!(unreachable.bump().await, None);
    }

    #[tokio::test]
    async fn test_transport_errors_convert_to_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(500);
        });

        let counter = UsageCounter::new(server.url("/exec"), None);
        let result = counter
            .request_count(counter.client.get(&counter.endpoint))
            .await;
        assert!(matches!(result, Err(FxError::ApiError(_))));

        let unreachable = UsageCounter::new("http://127.0.0.1:1/exec".to_string(), None);
        let result = unreachable
            .request_count(unreachable.client.get(&unreachable.endpoint))
            .await;
        assert!(matches!(result, Err(FxError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_record_use_reads_count_when_bump_is_rejected() {
        let server = MockServer::start();
        let bump_mock = server.mock(|when, then| {
            when.method(POST).path("/exec");
            then.status(403).body("forbidden");
        });
        let read_mock = server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200).json_body(serde_json::json!({"count": 41}));
        });

        let counter = UsageCounter::new(server.url("/exec"), Some("wrong".to_string()));

        assert_eq!(counter.record_use().await, Some(41));
        bump_mock.assert();
        read_mock.assert();
    }

    #[tokio::test]
    async fn test_record_use_skips_read_after_successful_bump() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/exec");
            then.status(200).json_body(serde_json::json!({"count": 42}));
        });
        let read_mock = server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200).json_body(serde_json::json!({"count": 41}));
        });

        let counter = UsageCounter::new(server.url("/exec"), None);

        assert_eq!(counter.record_use().await, Some(42));
        read_mock.assert_hits(0);
    }
}
