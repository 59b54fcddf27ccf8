//! カタログの型定義
//!
//! - CatalogItem: 生地・ラグ・木目仕上げの1エントリ
//! - FurnitureTemplate: ビジュアライザ用の家具写真
//! - BulkDraft: 一括取込でできる未確定の下書き
//!
//! 画像フィールドはすべて `data:image/jpeg;base64,...` 形式のData URL、
//! またはホストされた画像のURL文字列。空文字は「なし」を表す。

use crate::data_url::is_data_url;
use serde::{Deserialize, Serialize};

/// エントリの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 生地（テキスタイルモデル）
    #[default]
    Model,
    /// ラグ
    Rug,
    /// 木目仕上げ
    Wood,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Model => "model",
            Category::Rug => "rug",
            Category::Wood => "wood",
        }
    }

    /// 保存済みデータのラベルから種類を判定（不明なものは生地扱い）
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "rug" | "rugs" | "alfombra" => Category::Rug,
            "wood" | "madera" => Category::Wood,
            _ => Category::Model,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" | "fabric" | "textile" => Ok(Category::Model),
            "rug" => Ok(Category::Rug),
            "wood" => Ok(Category::Wood),
            _ => Err(format!("Unknown category: {}. Use model, rug, or wood", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 技術仕様（すべて自由記述）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Specs {
    pub composition: String,
    pub durability: String,
    pub usage: String,
    pub weight: String,
}

/// カラーバリエーション（名前と画像の組）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorVariant {
    pub name: String,
    pub image: String,
}

impl ColorVariant {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// バリエーション名を変更する（画像は組ごと移動する）
pub fn rename_variant(variants: &mut [ColorVariant], old: &str, new: &str) -> bool {
    match variants.iter_mut().find(|v| v.name == old) {
        Some(variant) => {
            variant.name = new.to_string();
            true
        }
        None => false,
    }
}

/// バリエーションを削除する
///
/// 削除した画像がメイン画像だった場合、残りの先頭バリエーションに付け替える。
pub fn remove_variant(
    variants: &mut Vec<ColorVariant>,
    main_image: &mut String,
    name: &str,
) -> Option<ColorVariant> {
    let index = variants.iter().position(|v| v.name == name)?;
    let removed = variants.remove(index);
    if !removed.image.is_empty() && removed.image == *main_image {
        *main_image = variants
            .iter()
            .map(|v| v.image.clone())
            .find(|img| !img.is_empty())
            .unwrap_or_default();
    }
    Some(removed)
}

/// カタログエントリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub supplier: String,
    /// カタログ／コレクション名
    pub catalog: String,
    /// 技術サマリー
    pub summary: String,
    pub specs: Specs,
    /// 名前の重複は許容（既知のエッジケース）
    pub variants: Vec<ColorVariant>,
    pub main_image: String,
    pub spec_image: String,
    pub spec_document: String,
    pub category: Category,
}

impl CatalogItem {
    pub fn color_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name.as_str())
    }

    /// 名前が一致する最初のバリエーション画像
    pub fn variant_image(&self, name: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.image.as_str())
            .filter(|img| !img.is_empty())
    }

    /// バリエーション名を変更する（画像は組ごと移動する）
    pub fn rename_variant(&mut self, old: &str, new: &str) -> bool {
        rename_variant(&mut self.variants, old, new)
    }

    /// バリエーションを削除する
    pub fn remove_variant(&mut self, name: &str) -> Option<ColorVariant> {
        remove_variant(&mut self.variants, &mut self.main_image, name)
    }

    pub fn has_main_image(&self) -> bool {
        !self.main_image.trim().is_empty()
    }

    /// リモートURLではなく埋め込み画像を持っているか
    pub fn has_embedded_image(&self) -> bool {
        is_data_url(&self.main_image) || self.variants.iter().any(|v| is_data_url(&v.image))
    }
}

/// 家具テンプレート
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FurnitureTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub supplier: String,
    /// Data URLまたはホスト画像のURL
    pub image: String,
    pub collection: String,
    /// セッション限りのテンプレート（保存しない）
    #[serde(skip)]
    pub ephemeral: bool,
}

/// 一括取込の下書き
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkDraft {
    pub temp_id: String,
    /// 確定時のレコードID（最初の確定で決まり、再試行でも変えない）
    pub item_id: String,
    pub name: String,
    pub supplier: String,
    pub catalog: String,
    pub category: Category,
    pub summary: String,
    pub specs: Specs,
    pub main_image: String,
    pub variants: Vec<ColorVariant>,
    pub spec_image: String,
    pub spec_document: String,
    /// 取込元フォルダ（表示用）
    pub source: String,
}

impl BulkDraft {
    pub fn rename_variant(&mut self, old: &str, new: &str) -> bool {
        rename_variant(&mut self.variants, old, new)
    }

    pub fn remove_variant(&mut self, name: &str) -> Option<ColorVariant> {
        remove_variant(&mut self.variants, &mut self.main_image, name)
    }

    /// バリエーションを追加する（メイン画像が空なら代表画像にする）
    pub fn add_variant(&mut self, variant: ColorVariant) {
        if self.main_image.is_empty() {
            self.main_image = variant.image.clone();
        }
        self.variants.push(variant);
    }

    /// 下書きからカタログエントリを組み立てる（メイン画像の検証は呼び出し側）
    pub fn to_catalog_item(&self, id: String) -> CatalogItem {
        CatalogItem {
            id,
            name: self.name.trim().to_string(),
            supplier: self.supplier.trim().to_string(),
            catalog: self.catalog.trim().to_string(),
            summary: self.summary.clone(),
            specs: self.specs.clone(),
            variants: self.variants.clone(),
            main_image: self.main_image.clone(),
            spec_image: self.spec_image.clone(),
            spec_document: self.spec_document.clone(),
            category: self.category,
        }
    }
}

/// AIによる仕様書抽出結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedDetails {
    pub name: String,
    pub supplier: String,
    pub summary: String,
    pub specs: Specs,
}
