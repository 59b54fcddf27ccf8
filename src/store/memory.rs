//! メモリ上のドキュメントストア
//!
//! テストやドライランで使う。失敗の注入と呼び出し履歴の記録ができる。

use super::{DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

/// 記録された呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Upsert(String, String),
    PutMany(String, Vec<String>),
    Delete(String, String),
    DeleteMany(String, Vec<String>),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    failures: Mutex<VecDeque<StoreError>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ドキュメントを直接投入する
    pub fn seed(&self, collection: &str, id: &str, document: Value) {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    /// 次の呼び出しを指定のエラーで失敗させる（積んだ順に消費）
    pub fn fail_next(&self, error: StoreError) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        match self.failures.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        self.record(StoreCall::List(collection.to_string()))?;
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.record(StoreCall::Upsert(collection.to_string(), id.to_string()))?;
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let docs = collections.entry(collection.to_string()).or_default();

        // マージ: 既存ドキュメントのトップレベルキーを上書き
        if let (Some(Value::Object(existing)), Value::Object(incoming)) = (docs.get_mut(id), &document) {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
            return Ok(());
        }
        docs.insert(id.to_string(), document);
        Ok(())
    }

    async fn put_many(&self, collection: &str, documents: Vec<(String, Value)>) -> Result<(), StoreError> {
        let ids = documents.iter().map(|(id, _)| id.clone()).collect();
        self.record(StoreCall::PutMany(collection.to_string(), ids))?;
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let docs = collections.entry(collection.to_string()).or_default();
        for (id, document) in documents {
            docs.insert(id, document);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(collection.to_string(), id.to_string()))?;
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteMany(collection.to_string(), ids.to_vec()))?;
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(docs) = collections.get_mut(collection) {
            for id in ids {
                docs.remove(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_merges_fields() {
        let store = MemoryStore::new();
        store.seed("fabrics", "a", json!({ "id": "a", "name": "Old", "supplier": "Acme" }));

        store
            .upsert("fabrics", "a", json!({ "name": "New" }))
            .await
            .unwrap();

        let doc = store.document("fabrics", "a").unwrap();
        assert_eq!(doc["name"], "New");
        assert_eq!(doc["supplier"], "Acme");
    }

    #[tokio::test]
    async fn test_put_many_overwrites() {
        let store = MemoryStore::new();
        store.seed("fabrics", "a", json!({ "id": "a", "supplier": "Acme" }));

        store
            .put_many("fabrics", vec![("a".into(), json!({ "id": "a" }))])
            .await
            .unwrap();

        assert!(store.document("fabrics", "a").unwrap().get("supplier").is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreError::transient("unavailable"));

        assert!(store.list("fabrics").await.is_err());
        assert!(store.list("fabrics").await.is_ok());
        assert_eq!(store.calls().len(), 2);
    }
}
