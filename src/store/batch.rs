//! レコードの読み書き（正規化・リトライ・チャンク分割）
//!
//! 画像を含むレコードは大きいので、一括保存は小さなチャンクに分け、
//! チャンク間に一定の待機を入れて順番に書き込む。
//! 途中のチャンクが失敗したら残りは中止し、保存済みのものは戻さない。

use super::retry::{with_retry, RetryPolicy};
use super::{DocumentStore, StoreError};
use crate::error::{CatalogError, Result};
use fabric_catalog_common::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// 1リクエストあたりのレコード数
    pub chunk_size: usize,
    /// チャンク間の待機（ミリ秒）
    pub chunk_pause_ms: u64,
    /// 全削除時の1バッチあたりの件数
    pub clear_batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1,
            chunk_pause_ms: 1500,
            clear_batch_size: 20,
            retry: RetryPolicy::default(),
        }
    }
}

impl BatchOptions {
    fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }
}

/// 一括保存の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub committed: usize,
    pub intended: usize,
}

/// ホワイトリストに沿って組み直したドキュメント
fn canonical_document<R: Record>(record: &R) -> (String, Value) {
    let canonical = R::from_document(&record.to_document());
    (canonical.id().to_string(), canonical.to_document())
}

pub struct CatalogRepository {
    store: Arc<dyn DocumentStore>,
    options: BatchOptions,
    cancel: CancellationToken,
}

impl CatalogRepository {
    pub fn new(store: Arc<dyn DocumentStore>, options: BatchOptions, cancel: CancellationToken) -> Self {
        Self { store, options, cancel }
    }

    /// 全件読み込み（読み込み後に正規化）
    pub async fn load_all<R: Record>(&self) -> Result<Vec<R>> {
        let store = &self.store;
        let documents = with_retry("list", &self.options.retry, &self.cancel, || {
            store.list(R::COLLECTION)
        })
        .await
        .map_err(|e| self.map_store_error(e, 0, 0))?;

        Ok(documents.iter().map(R::from_document).collect())
    }

    /// 1件保存（マージ）
    pub async fn save_one<R: Record>(&self, record: &R) -> Result<()> {
        let (id, document) = canonical_document(record);
        let store = &self.store;
        with_retry("upsert", &self.options.retry, &self.cancel, || {
            store.upsert(R::COLLECTION, &id, document.clone())
        })
        .await
        .map_err(|e| self.map_store_error(e, 0, 1))?;

        tracing::info!(collection = R::COLLECTION, id = %id, "Record saved");
        Ok(())
    }

    /// 一括保存（チャンク単位の上書き、順番に実行）
    pub async fn commit_all<R: Record>(
        &self,
        records: &[R],
        on_progress: impl Fn(usize, usize),
    ) -> Result<CommitReport> {
        let intended = records.len();
        let chunk_size = self.options.chunk_size.max(1);
        let mut committed = 0;
        let store = &self.store;

        for (index, chunk) in records.chunks(chunk_size).enumerate() {
            if index > 0 {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Err(CatalogError::Cancelled { committed, intended });
                    }
                    _ = tokio::time::sleep(self.options.chunk_pause()) => {}
                }
            }

            let documents: Vec<(String, Value)> = chunk.iter().map(canonical_document).collect();
            tracing::debug!(
                collection = R::COLLECTION,
                chunk = index + 1,
                records = documents.len(),
                "Writing chunk"
            );

            with_retry("put_many", &self.options.retry, &self.cancel, || {
                store.put_many(R::COLLECTION, documents.clone())
            })
            .await
            .map_err(|e| self.map_store_error(e, committed, intended))?;

            committed += chunk.len();
            on_progress(committed, intended);
        }

        tracing::info!(collection = R::COLLECTION, committed, "Batch commit finished");
        Ok(CommitReport { committed, intended })
    }

    pub async fn delete_one<R: Record>(&self, id: &str) -> Result<()> {
        let store = &self.store;
        with_retry("delete", &self.options.retry, &self.cancel, || {
            store.delete(R::COLLECTION, id)
        })
        .await
        .map_err(|e| self.map_store_error(e, 0, 1))?;
        Ok(())
    }

    /// コレクション全削除（一定件数ずつ、バッチ間に待機）
    pub async fn clear_all<R: Record>(&self) -> Result<usize> {
        let records: Vec<R> = self.load_all().await?;
        let ids: Vec<String> = records
            .iter()
            .map(|r| r.id().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        let intended = ids.len();
        let batch_size = self.options.clear_batch_size.max(1);
        let store = &self.store;
        let mut deleted = 0;

        for (index, batch) in ids.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Err(CatalogError::Cancelled { committed: deleted, intended });
                    }
                    _ = tokio::time::sleep(self.options.chunk_pause()) => {}
                }
            }

            with_retry("delete_many", &self.options.retry, &self.cancel, || {
                store.delete_many(R::COLLECTION, batch)
            })
            .await
            .map_err(|e| self.map_store_error(e, deleted, intended))?;

            deleted += batch.len();
        }

        tracing::info!(collection = R::COLLECTION, deleted, "Collection cleared");
        Ok(deleted)
    }

    fn map_store_error(&self, error: StoreError, committed: usize, intended: usize) -> CatalogError {
        if error.is_cancelled() {
            CatalogError::Cancelled { committed, intended }
        } else if intended > 1 {
            CatalogError::PartialCommit {
                committed,
                intended,
                source: error,
            }
        } else {
            CatalogError::Store(error)
        }
    }
}
