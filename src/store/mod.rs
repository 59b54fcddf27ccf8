//! リモートドキュメントストア
//!
//! ストアとの境界で、失敗を一度だけ型付きの区分（一時的／恒久的）に変換する。
//! 呼び出し側はメッセージ文字列を見て判定しない。

pub mod batch;
pub mod memory;
pub mod rest;
pub mod retry;

pub use batch::{BatchOptions, CatalogRepository, CommitReport};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// ストアエラーの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreErrorKind {
    /// ネットワーク断・サービス停止など（リトライ対象）
    Transient,
    /// 検証エラー・権限エラーなど（即時失敗）
    Permanent,
    /// ユーザーによる中断
    Cancelled,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: StoreErrorKind::Cancelled,
            message: "cancelled".into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == StoreErrorKind::Transient
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == StoreErrorKind::Cancelled
    }
}

/// ドキュメントストアの操作
///
/// ドキュメントはコレクション内でIDをキーに保持される。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// コレクションの全ドキュメント
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// 1件をマージ書き込み
    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    /// 複数件を上書き書き込み（1リクエスト）
    async fn put_many(&self, collection: &str, documents: Vec<(String, Value)>) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// 複数件を削除（1リクエスト）
    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), StoreError>;
}

/// 新しいレコードIDを生成（名前のスラッグ + 時刻ハッシュ）
pub fn new_record_id(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref NON_SLUG_RE: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    }

    let lower = name.to_lowercase();
    let slug = NON_SLUG_RE.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');

    let nanos = chrono::Local::now().timestamp_nanos_opt().unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = hex::encode(hasher.finalize());

    if slug.is_empty() {
        digest[..12].to_string()
    } else {
        format!("{}-{}", slug, &digest[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_kinds() {
        assert!(StoreError::transient("unavailable").is_transient());
        assert!(!StoreError::permanent("permission denied").is_transient());
        assert!(StoreError::cancelled().is_cancelled());
    }

    #[test]
    fn test_new_record_id_slug() {
        let id = new_record_id("Blue Velvet 01");
        assert!(id.starts_with("blue-velvet-01-"));
        assert_eq!(id.len(), "blue-velvet-01-".len() + 8);
    }

    #[test]
    fn test_new_record_id_without_ascii_name() {
        let id = new_record_id("ベルベット");
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
