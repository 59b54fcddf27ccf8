//! リモート画像参照の解決
//!
//! 画像参照（Data URL / URL / ローカルパス）を、Base64本体とMIMEタイプの組にする。
//! URLは以下の順に試し、最初に成功したものを使う。
//! 1. 直接取得（`image/*` のレスポンスのみ受け付ける）
//! 2. 緩い再取得（Content-Typeを無視してバイト列から形式を判定）
//! 3. 2をCORSリレー経由で実行

use super::{normalize_bytes, normalize_file_async, ImageBudget, NormalizedImage};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use fabric_catalog_common::{extract_base64_from_data_url, extract_mime_type_from_data_url, is_data_url};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Url};
use std::path::Path;
use std::time::Duration;

const CLIENT_USER_AGENT: &str = concat!("fabric-catalog/", env!("CARGO_PKG_VERSION"));
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// 解決済みの画像（Data URLの接頭辞を除いたもの）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub mime_type: String,
    pub base64: String,
}

impl ResolvedImage {
    fn from_data_url(data_url: &str) -> Option<Self> {
        Some(Self {
            mime_type: extract_mime_type_from_data_url(data_url).to_string(),
            base64: extract_base64_from_data_url(data_url)?.to_string(),
        })
    }

    pub fn data_url(&self) -> String {
        fabric_catalog_common::to_data_url(&self.mime_type, &self.base64)
    }
}

/// URLから画像を取得する方法
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str, budget: ImageBudget) -> Result<NormalizedImage>;
}

/// 直接取得
pub struct DirectFetch {
    client: Client,
}

impl DirectFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for DirectFetch {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fetch(&self, url: &str, budget: ImageBudget) -> Result<NormalizedImage> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| CatalogError::RemoteFetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CatalogError::RemoteFetch(format!("{}: HTTP {}", url, response.status().as_u16())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        if !content_type.starts_with("image/") {
            return Err(CatalogError::RemoteFetch(format!(
                "{}: 画像ではないレスポンス ({})",
                url, content_type
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CatalogError::RemoteFetch(format!("{}: {}", url, e)))?;
        normalize_bytes(&bytes, budget, url)
    }
}

/// Content-Typeを信用せず、中身から画像かどうか判定して取り込む
async fn fetch_sniffed(client: &Client, url: &str, label: &str, budget: ImageBudget) -> Result<NormalizedImage> {
    let response = client
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| CatalogError::RemoteFetch(format!("{}: {}", label, e)))?;

    if !response.status().is_success() {
        return Err(CatalogError::RemoteFetch(format!("{}: HTTP {}", label, response.status().as_u16())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CatalogError::RemoteFetch(format!("{}: {}", label, e)))?;

    match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => normalize_bytes(&bytes, budget, label),
        Some(kind) => Err(CatalogError::RemoteFetch(format!("{}: 画像ではありません ({})", label, kind.mime_type()))),
        None => Err(CatalogError::RemoteFetch(format!("{}: 形式を判定できません", label))),
    }
}

/// 緩い再取得
pub struct LenientFetch {
    client: Client,
}

impl LenientFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for LenientFetch {
    fn name(&self) -> &'static str {
        "lenient"
    }

    async fn fetch(&self, url: &str, budget: ImageBudget) -> Result<NormalizedImage> {
        fetch_sniffed(&self.client, url, url, budget).await
    }
}

/// CORSリレー経由の再取得
///
/// リレーURLに `url` クエリとして元のURLを渡す
pub struct RelayFetch {
    client: Client,
    relay_url: Url,
}

impl RelayFetch {
    pub fn new(client: Client, relay_url: &str) -> Result<Self> {
        let relay_url = Url::parse(relay_url)
            .map_err(|e| CatalogError::Config(format!("リレーURLが不正です ({}): {}", relay_url, e)))?;
        Ok(Self { client, relay_url })
    }

    pub fn relayed_url(&self, url: &str) -> String {
        let mut relayed = self.relay_url.clone();
        relayed.query_pairs_mut().append_pair("url", url);
        relayed.to_string()
    }
}

#[async_trait]
impl FetchStrategy for RelayFetch {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn fetch(&self, url: &str, budget: ImageBudget) -> Result<NormalizedImage> {
        fetch_sniffed(&self.client, &self.relayed_url(url), url, budget).await
    }
}

pub struct RemoteResolver {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl RemoteResolver {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// 標準の取得順（直接 → 緩い再取得 → リレー）
    pub fn with_defaults(timeout: Duration, relay_url: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        let mut strategies: Vec<Box<dyn FetchStrategy>> = vec![
            Box::new(DirectFetch::new(client.clone())),
            Box::new(LenientFetch::new(client.clone())),
        ];
        if let Some(relay) = relay_url.filter(|r| !r.trim().is_empty()) {
            strategies.push(Box::new(RelayFetch::new(client, relay)?));
        }
        Ok(Self::new(strategies))
    }

    /// 画像参照を解決
    ///
    /// - Data URL: そのまま分解して返す（再エンコードしない）
    /// - http(s) URL: 取得方法を順に試す
    /// - それ以外: ローカルファイルとして正規化
    pub async fn resolve(&self, reference: &str, budget: ImageBudget) -> Result<ResolvedImage> {
        let reference = reference.trim();
        if is_data_url(reference) {
            return ResolvedImage::from_data_url(reference)
                .ok_or_else(|| CatalogError::RemoteFetch("Data URLが不正です".into()));
        }

        let normalized = if is_remote_url(reference) {
            self.fetch_remote(reference, budget).await?
        } else {
            normalize_file_async(Path::new(reference), budget).await?
        };

        ResolvedImage::from_data_url(&normalized.data_url)
            .ok_or_else(|| CatalogError::image(reference, "正規化結果が不正です"))
    }

    async fn fetch_remote(&self, url: &str, budget: ImageBudget) -> Result<NormalizedImage> {
        for strategy in &self.strategies {
            match strategy.fetch(url, budget).await {
                Ok(image) => {
                    tracing::debug!(strategy = strategy.name(), url, "Remote image resolved");
                    return Ok(image);
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), url, error = %e, "Remote fetch attempt failed");
                }
            }
        }
        Err(CatalogError::RemoteFetch(url.to_string()))
    }
}

pub fn is_remote_url(reference: &str) -> bool {
    let lower = reference.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImagePreset;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        succeed: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FetchStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, url: &str, _budget: ImageBudget) -> Result<NormalizedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(NormalizedImage {
                    data_url: format!("data:image/jpeg;base64,{}", self.name),
                    width: 1,
                    height: 1,
                })
            } else {
                Err(CatalogError::RemoteFetch(url.to_string()))
            }
        }
    }

    fn scripted(name: &'static str, succeed: bool) -> (Box<dyn FetchStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Scripted {
                name,
                succeed,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn budget() -> ImageBudget {
        ImagePreset::Hero.default_budget()
    }

    #[tokio::test]
    async fn test_data_url_passthrough() {
        let (strategy, calls) = scripted("direct", true);
        let resolver = RemoteResolver::new(vec![strategy]);

        let resolved = resolver
            .resolve("data:image/png;base64,iVBORw0KGgo=", budget())
            .await
            .unwrap();

        assert_eq!(resolved.mime_type, "image/png");
        assert_eq!(resolved.base64, "iVBORw0KGgo=");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (direct, direct_calls) = scripted("direct", false);
        let (lenient, lenient_calls) = scripted("lenient", true);
        let (relay, relay_calls) = scripted("relay", true);
        let resolver = RemoteResolver::new(vec![direct, lenient, relay]);

        let resolved = resolver
            .resolve("https://cdn.example.com/sofa.jpg", budget())
            .await
            .unwrap();

        assert_eq!(resolved.base64, "lenient");
        assert_eq!(direct_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lenient_calls.load(Ordering::SeqCst), 1);
        assert_eq!(relay_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_strategies_fail() {
        let (direct, _) = scripted("direct", false);
        let (relay, relay_calls) = scripted("relay", false);
        let resolver = RemoteResolver::new(vec![direct, relay]);

        let err = resolver
            .resolve("https://cdn.example.com/missing.jpg", budget())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::RemoteFetch(_)));
        assert!(err.to_string().contains("ローカルの画像をアップロード"));
        assert_eq!(relay_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_path_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chair.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([10, 120, 200]))
            .save(&path)
            .unwrap();

        let resolver = RemoteResolver::new(Vec::new());
        let resolved = resolver.resolve(path.to_str().unwrap(), budget()).await.unwrap();
        assert_eq!(resolved.mime_type, "image/jpeg");
        assert!(!resolved.base64.is_empty());
    }

    #[tokio::test]
    async fn test_missing_local_path() {
        let resolver = RemoteResolver::new(Vec::new());
        let err = resolver.resolve("/nonexistent/chair.png", budget()).await.unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound(_)));
    }

    #[test]
    fn test_relayed_url_encodes_target() {
        let relay = RelayFetch::new(Client::new(), "https://relay.example.com/raw").unwrap();
        assert_eq!(
            relay.relayed_url("https://cdn.example.com/a b.jpg?x=1"),
            "https://relay.example.com/raw?url=https%3A%2F%2Fcdn.example.com%2Fa+b.jpg%3Fx%3D1"
        );
    }

    #[test]
    fn test_is_remote_url() {
        assert!(is_remote_url("HTTPS://cdn.example.com/a.jpg"));
        assert!(!is_remote_url("./sofa.jpg"));
    }
}
