//! 一括保存テスト
//!
//! チャンク分割・待機・リトライ・途中失敗・キャンセル・全削除を検証
//! （時間は tokio の仮想時計で進める）

use async_trait::async_trait;
use fabric_catalog::error::CatalogError;
use fabric_catalog::store::memory::StoreCall;
use fabric_catalog::store::{
    BatchOptions, CatalogRepository, DocumentStore, MemoryStore, RetryPolicy, StoreError,
};
use fabric_catalog_common::{CatalogItem, ColorVariant};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn item(id: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: id.to_uppercase(),
        main_image: format!("data:image/jpeg;base64,{}", id),
        variants: vec![ColorVariant::new("Red", format!("data:image/jpeg;base64,{}", id))],
        ..Default::default()
    }
}

fn put_many_calls(store: &MemoryStore) -> Vec<Vec<String>> {
    store
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            StoreCall::PutMany(_, ids) => Some(ids),
            _ => None,
        })
        .collect()
}

/// n回目の put_many だけ失敗させるストア
struct FailingNthWrite {
    inner: MemoryStore,
    fail_on: usize,
    error: StoreError,
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FailingNthWrite {
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.inner.list(collection).await
    }

    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.inner.upsert(collection, id, document).await
    }

    async fn put_many(&self, collection: &str, documents: Vec<(String, Value)>) -> Result<(), StoreError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(self.error.clone());
        }
        self.inner.put_many(collection, documents).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        self.inner.delete_many(collection, ids).await
    }
}

/// 1件ずつ、チャンク間に1.5秒待機
#[tokio::test(start_paused = true)]
async fn test_commit_one_record_per_chunk_with_pause() {
    let store = Arc::new(MemoryStore::new());
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), CancellationToken::new());
    let items = vec![item("a"), item("b"), item("c")];

    let progress = std::sync::Mutex::new(Vec::new());
    let started = Instant::now();
    let report = repo
        .commit_all(&items, |done, total| progress.lock().unwrap().push((done, total)))
        .await
        .unwrap();

    assert_eq!(report.committed, 3);
    assert_eq!(report.intended, 3);
    assert_eq!(
        put_many_calls(&store),
        vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
    );
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    assert_eq!(*progress.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(store.count("fabrics"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_larger_chunks() {
    let store = Arc::new(MemoryStore::new());
    let options = BatchOptions {
        chunk_size: 2,
        ..Default::default()
    };
    let repo = CatalogRepository::new(store.clone(), options, CancellationToken::new());
    let items: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|id| item(id)).collect();

    repo.commit_all(&items, |_, _| {}).await.unwrap();

    let sizes: Vec<usize> = put_many_calls(&store).iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

/// 一時的な失敗はバックオフ後に再試行される
#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreError::transient("503 Service Unavailable"));
    store.fail_next(StoreError::transient("deadline exceeded"));
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), CancellationToken::new());

    let started = Instant::now();
    let report = repo.commit_all(&[item("a")], |_, _| {}).await.unwrap();

    assert_eq!(report.committed, 1);
    assert_eq!(put_many_calls(&store).len(), 3);
    // 1秒 + 2秒
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted() {
    let store = Arc::new(MemoryStore::new());
    for _ in 0..3 {
        store.fail_next(StoreError::transient("unavailable"));
    }
    let options = BatchOptions {
        retry: RetryPolicy {
            max_retries: 2,
            initial_delay_ms: 100,
        },
        ..Default::default()
    };
    let repo = CatalogRepository::new(store.clone(), options, CancellationToken::new());

    let err = repo.commit_all(&[item("a")], |_, _| {}).await.unwrap_err();
    assert!(matches!(err, CatalogError::Store(ref e) if e.is_transient()));
    assert_eq!(put_many_calls(&store).len(), 3);
    assert_eq!(store.count("fabrics"), 0);
}

/// 恒久的な失敗は再試行せず、保存済み件数を返す
#[tokio::test(start_paused = true)]
async fn test_permanent_failure_mid_batch() {
    let store = Arc::new(FailingNthWrite {
        inner: MemoryStore::new(),
        fail_on: 2,
        error: StoreError::permanent("403 permission denied"),
        writes: AtomicUsize::new(0),
    });
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), CancellationToken::new());

    let err = repo
        .commit_all(&[item("a"), item("b"), item("c")], |_, _| {})
        .await
        .unwrap_err();

    match err {
        CatalogError::PartialCommit {
            committed,
            intended,
            source,
        } => {
            assert_eq!(committed, 1);
            assert_eq!(intended, 3);
            assert!(!source.is_transient());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    assert_eq!(store.inner.count("fabrics"), 1);
}

/// チャンク間の待機中にキャンセル
#[tokio::test(start_paused = true)]
async fn test_cancel_between_chunks() {
    let store = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), cancel.clone());

    let err = repo
        .commit_all(&[item("a"), item("b"), item("c")], |done, _| {
            if done == 1 {
                cancel.cancel();
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Cancelled {
            committed: 1,
            intended: 3
        }
    ));
    assert_eq!(put_many_calls(&store).len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_commit() {
    let store = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), cancel);

    let err = repo.commit_all(&[item("a"), item("b")], |_, _| {}).await.unwrap_err();
    assert!(matches!(err, CatalogError::Cancelled { committed: 0, .. }));
    assert!(store.calls().is_empty());
}

/// 全削除は一定件数ずつ
#[tokio::test(start_paused = true)]
async fn test_clear_all_in_batches() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..45 {
        let id = format!("fabric-{:02}", i);
        store.seed("fabrics", &id, json!({ "id": id, "name": "Linen" }));
    }
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), CancellationToken::new());

    let started = Instant::now();
    let deleted = repo.clear_all::<CatalogItem>().await.unwrap();

    assert_eq!(deleted, 45);
    assert_eq!(store.count("fabrics"), 0);
    let batches: Vec<usize> = store
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            StoreCall::DeleteMany(_, ids) => Some(ids.len()),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![20, 20, 5]);
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
}

/// 読み込み時に未知フィールドを捨て、旧形式を変換する
#[tokio::test]
async fn test_load_canonicalizes_documents() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "fabrics",
        "old-1",
        json!({
            "id": "old-1",
            "name": "Chenille",
            "supplier": null,
            "colors": ["Grey", "Ochre"],
            "colorImages": { "Grey": "https://cdn.example.com/grey.jpg", "Teal": "https://cdn.example.com/teal.jpg" },
            "pdfUrl": "https://cdn.example.com/chenille.pdf",
            "__editorState": { "dirty": true },
            "category": "Rugs"
        }),
    );
    let repo = CatalogRepository::new(store.clone(), BatchOptions::default(), CancellationToken::new());

    let items: Vec<CatalogItem> = repo.load_all().await.unwrap();
    assert_eq!(items.len(), 1);
    let chenille = &items[0];
    assert_eq!(chenille.supplier, "");
    let names: Vec<&str> = chenille.color_names().collect();
    assert_eq!(names, vec!["Grey", "Ochre", "Teal"]);
    assert_eq!(chenille.variant_image("Ochre"), None);
    assert_eq!(chenille.variant_image("teal"), Some("https://cdn.example.com/teal.jpg"));
    assert_eq!(chenille.spec_document, "https://cdn.example.com/chenille.pdf");

    // 書き戻すと正規形になる
    repo.save_one(chenille).await.unwrap();
    let written = store.document("fabrics", "old-1").unwrap();
    let obj = written.as_object().unwrap();
    assert!(obj.contains_key("variants"));
    assert_eq!(obj["category"], "rug");
    assert_eq!(obj["specDocument"], "https://cdn.example.com/chenille.pdf");
}
