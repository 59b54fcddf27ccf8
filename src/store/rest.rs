//! REST JSONドキュメントストア
//!
//! - `GET    {base}/{collection}`              全件取得（配列 または {"documents": [...]}）
//! - `PATCH  {base}/{collection}/{id}`         1件マージ書き込み
//! - `POST   {base}/{collection}:batchWrite`   複数件上書き
//! - `DELETE {base}/{collection}/{id}`         1件削除
//! - `POST   {base}/{collection}:batchDelete`  複数件削除

use super::{DocumentStore, StoreError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use std::time::Duration;

pub struct RestStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::permanent(format!("HTTPクライアント初期化エラー: {}", e)))?;

        let parsed = Url::parse(base_url)
            .map_err(|e| StoreError::permanent(format!("ストアURLが不正です: {} ({})", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::permanent(format!("ストアURLが不正です: {}", base_url)));
        }

        Ok(Self {
            client,
            base_url: parsed,
            token,
        })
    }

    /// ベースURLにパスセグメントを足す（IDの `/` や `?` はエスケープされる）
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>());
        if is_transient_status(status) {
            Err(StoreError::transient(message))
        } else {
            Err(StoreError::permanent(message))
        }
    }
}

/// 一時的エラーとみなすHTTPステータス
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn classify_request_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        StoreError::transient(format!("ネットワークエラー: {}", err))
    } else {
        StoreError::permanent(format!("リクエストエラー: {}", err))
    }
}

/// 一覧レスポンスからドキュメント配列を取り出す
fn documents_from_body(body: Value) -> Result<Vec<Value>, StoreError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("documents") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(StoreError::permanent("documents が配列ではありません")),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(StoreError::permanent("一覧レスポンスの形式が不正です")),
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let response = self.send(self.client.get(self.url(&[collection]))).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::permanent(format!("レスポンスのパースに失敗: {}", e)))?;
        documents_from_body(body)
    }

    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        let url = self.url(&[collection, id]);
        self.send(self.client.patch(url).json(&document)).await?;
        Ok(())
    }

    async fn put_many(&self, collection: &str, documents: Vec<(String, Value)>) -> Result<(), StoreError> {
        let writes: Vec<Value> = documents
            .into_iter()
            .map(|(id, document)| json!({ "id": id, "document": document }))
            .collect();
        let endpoint = format!("{}:batchWrite", collection);
        let url = self.url(&[endpoint.as_str()]);
        self.send(self.client.post(url).json(&json!({ "writes": writes }))).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&[collection, id]);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        let endpoint = format!("{}:batchDelete", collection);
        let url = self.url(&[endpoint.as_str()]);
        self.send(self.client.post(url).json(&json!({ "ids": ids }))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::FORBIDDEN));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_documents_from_body_shapes() {
        assert_eq!(documents_from_body(json!([{ "id": "a" }])).unwrap().len(), 1);
        assert_eq!(documents_from_body(json!({ "documents": [{}, {}] })).unwrap().len(), 2);
        assert!(documents_from_body(json!({})).unwrap().is_empty());
        assert!(documents_from_body(json!("oops")).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        // discardポートは通常待ち受けていない
        let store = RestStore::new("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
        let err = store.list("fabrics").await.unwrap_err();
        assert!(err.is_transient(), "{:?}", err);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = RestStore::new("https://db.example.com/v1/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(store.url(&["fabrics"]).as_str(), "https://db.example.com/v1/fabrics");

        let store = RestStore::new("http://localhost:8080", None, Duration::from_secs(5)).unwrap();
        assert_eq!(store.url(&["fabrics:batchWrite"]).as_str(), "http://localhost:8080/fabrics:batchWrite");
    }

    /// 旧データのIDに `/` や空白が入っていても別のパスにならない
    #[test]
    fn test_record_id_is_percent_encoded() {
        let store = RestStore::new("https://db.example.com/v1/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.url(&["fabrics", "a/b c?"]).as_str(),
            "https://db.example.com/v1/fabrics/a%2Fb%20c%3F"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RestStore::new("db.example.com", None, Duration::from_secs(5)).err().unwrap();
        assert!(!err.is_transient());
    }
}
