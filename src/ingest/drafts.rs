//! 下書きファイル
//!
//! 取込でできた下書きは確定するまで `drafts.json` に置き、
//! 複数のコマンドにまたがって確認・編集できるようにする。

use crate::error::{CatalogError, Result};
use crate::store::new_record_id;
use fabric_catalog_common::{BulkDraft, CatalogItem, Category, ColorVariant, ExtractedDetails};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const DRAFTS_FILE_NAME: &str = "drafts.json";

/// 下書きの項目変更（Noneは変更なし）
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    pub name: Option<String>,
    pub supplier: Option<String>,
    pub catalog: Option<String>,
    pub category: Option<Category>,
    pub summary: Option<String>,
}

impl DraftUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.supplier.is_none()
            && self.catalog.is_none()
            && self.category.is_none()
            && self.summary.is_none()
    }

    pub fn apply(&self, draft: &mut BulkDraft) {
        if let Some(name) = &self.name {
            draft.name = name.clone();
        }
        if let Some(supplier) = &self.supplier {
            draft.supplier = supplier.clone();
        }
        if let Some(catalog) = &self.catalog {
            draft.catalog = catalog.clone();
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(summary) = &self.summary {
            draft.summary = summary.clone();
        }
    }
}

/// AI抽出結果で下書きを埋める（空の値では上書きしない）
pub fn apply_extracted(draft: &mut BulkDraft, details: &ExtractedDetails) {
    let fill = |target: &mut String, value: &str| {
        if !value.trim().is_empty() {
            *target = value.trim().to_string();
        }
    };
    fill(&mut draft.name, &details.name);
    fill(&mut draft.supplier, &details.supplier);
    fill(&mut draft.summary, &details.summary);
    fill(&mut draft.specs.composition, &details.specs.composition);
    fill(&mut draft.specs.durability, &details.specs.durability);
    fill(&mut draft.specs.usage, &details.specs.usage);
    fill(&mut draft.specs.weight, &details.specs.weight);
}

#[derive(Debug, Clone)]
pub struct DraftFile {
    path: PathBuf,
    drafts: Vec<BulkDraft>,
}

impl DraftFile {
    /// 下書きファイルを読み込み（存在しない・壊れている場合は空）
    pub fn load(path: &Path) -> Self {
        let drafts = match File::open(path) {
            Ok(file) => match serde_json::from_reader(BufReader::new(file)) {
                Ok(drafts) => drafts,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Draft file unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self {
            path: path.to_path_buf(),
            drafts,
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, &self.drafts)?;
        Ok(())
    }

    pub fn drafts(&self) -> &[BulkDraft] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// 下書きを追加し、連番の一時IDを振る
    pub fn append(&mut self, drafts: Vec<BulkDraft>) -> Vec<String> {
        let mut next = self
            .drafts
            .iter()
            .filter_map(|d| d.temp_id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        let mut ids = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            next += 1;
            draft.temp_id = next.to_string();
            ids.push(draft.temp_id.clone());
            self.drafts.push(draft);
        }
        ids
    }

    pub fn get(&self, temp_id: &str) -> Result<&BulkDraft> {
        self.drafts
            .iter()
            .find(|d| d.temp_id == temp_id)
            .ok_or_else(|| CatalogError::DraftNotFound(temp_id.to_string()))
    }

    pub fn get_mut(&mut self, temp_id: &str) -> Result<&mut BulkDraft> {
        self.drafts
            .iter_mut()
            .find(|d| d.temp_id == temp_id)
            .ok_or_else(|| CatalogError::DraftNotFound(temp_id.to_string()))
    }

    pub fn update(&mut self, temp_id: &str, update: &DraftUpdate) -> Result<()> {
        update.apply(self.get_mut(temp_id)?);
        Ok(())
    }

    pub fn rename_variant(&mut self, temp_id: &str, old: &str, new: &str) -> Result<()> {
        if self.get_mut(temp_id)?.rename_variant(old, new.trim()) {
            Ok(())
        } else {
            Err(CatalogError::VariantNotFound(old.to_string()))
        }
    }

    /// バリエーションを削除（代表画像だった場合は残りの先頭に付け替え）
    pub fn remove_variant(&mut self, temp_id: &str, name: &str) -> Result<ColorVariant> {
        self.get_mut(temp_id)?
            .remove_variant(name)
            .ok_or_else(|| CatalogError::VariantNotFound(name.to_string()))
    }

    pub fn add_variant(&mut self, temp_id: &str, variant: ColorVariant) -> Result<()> {
        self.get_mut(temp_id)?.add_variant(variant);
        Ok(())
    }

    pub fn discard(&mut self, temp_id: &str) -> Result<BulkDraft> {
        let index = self
            .drafts
            .iter()
            .position(|d| d.temp_id == temp_id)
            .ok_or_else(|| CatalogError::DraftNotFound(temp_id.to_string()))?;
        Ok(self.drafts.remove(index))
    }

    pub fn discard_all(&mut self) -> usize {
        let count = self.drafts.len();
        self.drafts.clear();
        count
    }

    /// レコードIDが未定の下書きにIDを振る（振った件数を返す）
    ///
    /// 保存に失敗した下書きを再度確定しても、同じレコードとして扱われる。
    pub fn assign_item_ids(&mut self) -> usize {
        let mut assigned = 0;
        for draft in self.drafts.iter_mut().filter(|d| d.item_id.is_empty()) {
            draft.item_id = new_record_id(&draft.name);
            assigned += 1;
        }
        assigned
    }

    /// 確定済みの下書きを取り除く
    pub fn remove_committed(&mut self, temp_ids: &[String]) {
        self.drafts.retain(|d| !temp_ids.contains(&d.temp_id));
    }
}

fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 確定済みのエントリと名前が重複する下書き（大文字小文字は区別しない）
///
/// 下書き同士の重複は見ない。
pub fn find_duplicates<'a>(drafts: &'a [BulkDraft], committed: &[CatalogItem]) -> Vec<&'a BulkDraft> {
    drafts
        .iter()
        .filter(|d| {
            let name = normalized_name(&d.name);
            !name.is_empty() && committed.iter().any(|item| normalized_name(&item.name) == name)
        })
        .collect()
}

/// 下書きを確定用のエントリに変換（レコードIDが未定なら新しく振る）
pub fn drafts_to_items(drafts: &[BulkDraft]) -> Result<Vec<CatalogItem>> {
    drafts
        .iter()
        .map(|draft| {
            if draft.main_image.trim().is_empty() {
                return Err(CatalogError::MissingMainImage(draft.name.clone()));
            }
            let id = if draft.item_id.is_empty() {
                new_record_id(&draft.name)
            } else {
                draft.item_id.clone()
            };
            Ok(draft.to_catalog_item(id))
        })
        .collect()
}
