//! カタログ操作（リモートストア + ローカル退避キャッシュ）
//!
//! リモートが正本。キャッシュは書き込みを試みるたびに更新し、
//! リモートから読めたときは読めた内容で置き換える（空のときは置き換えない）。
//! キャッシュの保存に失敗しても操作自体は失敗させない。

use crate::cache::{self, LocalCache, RescueOutcome};
use crate::error::Result;
use crate::store::{CatalogRepository, CommitReport};
use fabric_catalog_common::{CatalogItem, FurnitureTemplate};

pub struct Catalog {
    repo: CatalogRepository,
    cache: LocalCache,
}

impl Catalog {
    pub fn new(repo: CatalogRepository, cache: LocalCache) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    fn persist_cache(&self) {
        if let Err(e) = self.cache.save() {
            tracing::warn!(path = %self.cache.path().display(), error = %e, "Local cache not written");
        }
    }

    pub async fn load_items(&mut self) -> Result<Vec<CatalogItem>> {
        let items: Vec<CatalogItem> = self.repo.load_all().await?;
        if !items.is_empty() {
            self.cache.replace_all(items.clone());
            self.persist_cache();
        }
        Ok(items)
    }

    /// 一括保存（結果にかかわらず、試みたエントリはキャッシュに残す）
    pub async fn commit_items(
        &mut self,
        items: &[CatalogItem],
        on_progress: impl Fn(usize, usize),
    ) -> Result<CommitReport> {
        let result = self.repo.commit_all(items, on_progress).await;
        self.cache.merge(items);
        self.persist_cache();
        result
    }

    pub async fn save_item(&mut self, item: &CatalogItem) -> Result<()> {
        let result = self.repo.save_one(item).await;
        self.cache.merge(std::slice::from_ref(item));
        self.persist_cache();
        result
    }

    pub async fn delete_item(&mut self, id: &str) -> Result<()> {
        self.repo.delete_one::<CatalogItem>(id).await?;
        if self.cache.remove(id) {
            self.persist_cache();
        }
        Ok(())
    }

    /// カタログを全削除（キャッシュも空にする）
    pub async fn clear_items(&mut self) -> Result<usize> {
        let deleted = self.repo.clear_all::<CatalogItem>().await?;
        self.cache.replace_all(Vec::new());
        self.persist_cache();
        Ok(deleted)
    }

    /// 起動時の復旧（リモートが空で、キャッシュに埋め込み画像がある場合のみ）
    pub async fn rescue(
        &self,
        remote_count: usize,
        confirm: impl FnOnce(usize) -> bool,
        on_progress: impl Fn(usize, usize),
    ) -> Result<RescueOutcome> {
        cache::run_rescue(&self.repo, &self.cache, remote_count, confirm, on_progress).await
    }

    pub async fn load_templates(&self) -> Result<Vec<FurnitureTemplate>> {
        self.repo.load_all().await
    }

    /// 家具テンプレートを保存（セッション限りのものは保存しない）
    pub async fn save_template(&self, template: &FurnitureTemplate) -> Result<()> {
        if template.ephemeral {
            tracing::debug!(id = %template.id, "Ephemeral template not persisted");
            return Ok(());
        }
        self.repo.save_one(template).await
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        self.repo.delete_one::<FurnitureTemplate>(id).await
    }
}
