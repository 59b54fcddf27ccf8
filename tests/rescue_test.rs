//! ローカル退避キャッシュからの復旧テスト

use fabric_catalog::cache::{LocalCache, RescueOutcome};
use fabric_catalog::catalog::Catalog;
use fabric_catalog::error::CatalogError;
use fabric_catalog::ingest::drafts::{self, DraftFile};
use fabric_catalog::store::memory::StoreCall;
use fabric_catalog::store::{BatchOptions, CatalogRepository, MemoryStore, StoreError};
use fabric_catalog_common::{BulkDraft, CatalogItem, ColorVariant};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn embedded(id: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Fabric {}", id),
        main_image: "data:image/jpeg;base64,/9j/AAAA".to_string(),
        variants: vec![ColorVariant::new("Sand", "data:image/jpeg;base64,/9j/BBBB")],
        ..Default::default()
    }
}

fn hosted(id: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Hosted {}", id),
        main_image: "https://cdn.example.com/hosted.jpg".to_string(),
        ..Default::default()
    }
}

fn seed_cache(path: &Path, items: Vec<CatalogItem>) {
    let mut cache = LocalCache::load(path);
    cache.replace_all(items);
    cache.save().unwrap();
}

fn open(store: &Arc<MemoryStore>, cache_path: &Path) -> Catalog {
    let options = BatchOptions {
        chunk_pause_ms: 0,
        ..Default::default()
    };
    let repo = CatalogRepository::new(store.clone(), options, CancellationToken::new());
    Catalog::new(repo, LocalCache::load(cache_path))
}

fn writes(store: &MemoryStore) -> usize {
    store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::PutMany(..) | StoreCall::Upsert(..)))
        .count()
}

/// リモートが空のとき、埋め込み画像を持つエントリだけをちょうど1回ずつ送る
#[tokio::test]
async fn test_rescue_pushes_embedded_entries_once() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");
    seed_cache(&cache_path, vec![embedded("a"), hosted("h"), embedded("b")]);

    let store = Arc::new(MemoryStore::new());
    let catalog = open(&store, &cache_path);

    let mut offered = None;
    let outcome = catalog
        .rescue(
            0,
            |available| {
                offered = Some(available);
                true
            },
            |_, _| {},
        )
        .await
        .unwrap();

    assert_eq!(offered, Some(2));
    match outcome {
        RescueOutcome::Restored(report) => assert_eq!(report.committed, 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(writes(&store), 2);
    assert!(store.document("fabrics", "a").is_some());
    assert!(store.document("fabrics", "b").is_some());
    assert!(store.document("fabrics", "h").is_none());
}

#[tokio::test]
async fn test_rescue_declined_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");
    seed_cache(&cache_path, vec![embedded("a")]);

    let store = Arc::new(MemoryStore::new());
    let catalog = open(&store, &cache_path);

    let outcome = catalog.rescue(0, |_| false, |_, _| {}).await.unwrap();
    assert_eq!(outcome, RescueOutcome::Declined { available: 1 });
    assert!(store.calls().is_empty());
}

/// リモートにデータがあるときは提案しない
#[tokio::test]
async fn test_no_rescue_when_remote_has_data() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");
    seed_cache(&cache_path, vec![embedded("a")]);

    let store = Arc::new(MemoryStore::new());
    store.seed("fabrics", "remote", json!({ "id": "remote", "name": "Remote" }));
    let mut catalog = open(&store, &cache_path);

    let remote = catalog.load_items().await.unwrap();
    let outcome = catalog
        .rescue(remote.len(), |_| panic!("should not ask"), |_, _| {})
        .await
        .unwrap();
    assert_eq!(outcome, RescueOutcome::NotNeeded);

    // リモートの内容でキャッシュが置き換わる
    let cache = LocalCache::load(&cache_path);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.items()[0].id, "remote");
}

/// 保存に失敗した変更はキャッシュに残り、次回の復旧対象になる
#[tokio::test]
async fn test_failed_commit_is_rescued_next_session() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");

    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreError::permanent("quota exceeded"));
    let mut catalog = open(&store, &cache_path);

    let err = catalog
        .commit_items(&[embedded("x"), embedded("y")], |_, _| {})
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::PartialCommit { committed: 0, intended: 2, .. }));
    assert_eq!(store.count("fabrics"), 0);

    // 次のセッション: リモートが空のまま読み込んでもキャッシュは消えない
    let mut next = open(&store, &cache_path);
    let remote = next.load_items().await.unwrap();
    assert!(remote.is_empty());
    assert_eq!(next.cache().len(), 2);

    let outcome = next.rescue(remote.len(), |_| true, |_, _| {}).await.unwrap();
    assert!(matches!(outcome, RescueOutcome::Restored(report) if report.committed == 2));
    assert_eq!(store.count("fabrics"), 2);
}

/// 同じ下書きの確定に2回失敗しても、復旧で送られるのは1件だけ
#[tokio::test]
async fn test_retried_draft_commit_keeps_one_record() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");
    let drafts_path = dir.path().join("drafts.json");

    let mut draft_file = DraftFile::load(&drafts_path);
    let mut draft = BulkDraft {
        name: "Mohair".to_string(),
        ..Default::default()
    };
    draft.add_variant(ColorVariant::new("Moss", "data:image/jpeg;base64,/9j/CCCC"));
    draft_file.append(vec![draft]);
    draft_file.save().unwrap();

    let store = Arc::new(MemoryStore::new());
    for _ in 0..2 {
        // コマンドごとに下書きファイルを読み直す
        let mut draft_file = DraftFile::load(&drafts_path);
        draft_file.assign_item_ids();
        draft_file.save().unwrap();
        let items = drafts::drafts_to_items(draft_file.drafts()).unwrap();

        store.fail_next(StoreError::permanent("quota exceeded"));
        let mut catalog = open(&store, &cache_path);
        let err = catalog.commit_items(&items, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, CatalogError::Store(_)));
        assert_eq!(DraftFile::load(&drafts_path).len(), 1);
    }

    let next = open(&store, &cache_path);
    assert_eq!(next.cache().len(), 1);

    let outcome = next.rescue(0, |_| true, |_, _| {}).await.unwrap();
    assert!(matches!(outcome, RescueOutcome::Restored(report) if report.committed == 1));
    assert_eq!(store.count("fabrics"), 1);
}

/// キャッシュファイルが壊れていても起動できる
#[tokio::test]
async fn test_corrupted_cache_offers_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("local-catalog.json");
    std::fs::write(&cache_path, "{ not json").unwrap();

    let store = Arc::new(MemoryStore::new());
    let catalog = open(&store, &cache_path);

    let outcome = catalog.rescue(0, |_| true, |_, _| {}).await.unwrap();
    assert_eq!(outcome, RescueOutcome::NotNeeded);
}
