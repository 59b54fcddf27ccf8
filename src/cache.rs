//! ローカル退避キャッシュ
//!
//! リモートに届かなかった変更を失わないための最後の手段。
//! 正本として扱うことはなく、リモートにデータがあるときは参照しない。
//! 形式はストアと同じホワイトリストスキーマのJSON配列。

use crate::error::Result;
use crate::store::{CatalogRepository, CommitReport};
use fabric_catalog_common::{CatalogItem, Record};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = "local-catalog.json";

#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
    items: Vec<CatalogItem>,
}

impl LocalCache {
    /// キャッシュファイルを読み込み（存在しない・壊れている場合は空）
    pub fn load(path: &Path) -> Self {
        let empty = Self {
            path: path.to_path_buf(),
            items: Vec::new(),
        };

        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => return empty,
        };

        match serde_json::from_reader::<_, Vec<Value>>(BufReader::new(file)) {
            Ok(documents) => Self {
                path: path.to_path_buf(),
                items: documents.iter().map(CatalogItem::from_document).collect(),
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local cache unreadable, ignoring");
                empty
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let documents: Vec<Value> = self.items.iter().map(|item| item.to_document()).collect();
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &documents)?;
        Ok(())
    }

    /// キャッシュファイルを削除
    pub fn clear(path: &Path) -> Result<bool> {
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// IDが同じものは置き換え、新しいものは追加
    pub fn merge(&mut self, items: &[CatalogItem]) {
        for item in items {
            match self.items.iter_mut().find(|i| !item.id.is_empty() && i.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => self.items.push(item.clone()),
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn replace_all(&mut self, items: Vec<CatalogItem>) {
        self.items = items;
    }

    /// 埋め込み画像を持つエントリ
    pub fn embedded_entries(&self) -> Vec<CatalogItem> {
        self.items
            .iter()
            .filter(|i| i.has_embedded_image())
            .cloned()
            .collect()
    }
}

/// 復旧の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescueOutcome {
    /// リモートにデータがある、またはキャッシュに対象がない
    NotNeeded,
    Declined { available: usize },
    Restored(CommitReport),
}

/// 復旧対象（リモートが空でキャッシュに埋め込み画像がある場合のみ）
pub fn rescue_candidates(remote_count: usize, cache: &LocalCache) -> Option<Vec<CatalogItem>> {
    if remote_count > 0 {
        return None;
    }
    let entries = cache.embedded_entries();
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

/// 起動時の復旧フロー
///
/// `confirm` には対象件数が渡され、trueで復旧を実行する。
pub async fn run_rescue(
    repo: &CatalogRepository,
    cache: &LocalCache,
    remote_count: usize,
    confirm: impl FnOnce(usize) -> bool,
    on_progress: impl Fn(usize, usize),
) -> Result<RescueOutcome> {
    let Some(entries) = rescue_candidates(remote_count, cache) else {
        return Ok(RescueOutcome::NotNeeded);
    };

    if !confirm(entries.len()) {
        tracing::info!(available = entries.len(), "Local rescue declined");
        return Ok(RescueOutcome::Declined {
            available: entries.len(),
        });
    }

    let report = repo.commit_all(&entries, on_progress).await?;
    tracing::info!(restored = report.committed, "Local cache pushed to remote store");
    Ok(RescueOutcome::Restored(report))
}
