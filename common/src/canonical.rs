//! 正規化（ホワイトリストスキーマによる再構築）
//!
//! ストアへの書き込み前と読み込み後に、すべてのレコードをフィールド単位で
//! 組み立て直す。
//! - 未知のフィールドは捨てる
//! - 欠損・nullのスカラーは空文字にする
//! - 入れ子のマップはキーと値を1つずつ作り直す
//!
//! 旧形式（`colors` 配列 + `colorImages` マップ）は `variants` に変換する。

use crate::types::{CatalogItem, Category, ColorVariant, FurnitureTemplate, Specs};
use serde_json::{json, Map, Value};

/// ストアに保存されるレコード
pub trait Record: Sized {
    /// コレクション名
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// ドキュメントからホワイトリストに沿って再構築
    fn from_document(doc: &Value) -> Self;

    /// ホワイトリストに沿ったドキュメントを生成
    fn to_document(&self) -> Value;

    /// 埋め込み画像（Data URL）を持っているか
    fn has_embedded_image(&self) -> bool;
}

/// スカラー値を文字列に変換（null・欠損・配列・オブジェクトは空文字）
fn scalar(obj: Option<&Map<String, Value>>, key: &str) -> String {
    match obj.and_then(|m| m.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// 最初に空でない値を持つキーを採用
fn first_scalar(obj: Option<&Map<String, Value>>, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| scalar(obj, k))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn canonical_specs(value: Option<&Value>) -> Specs {
    let obj = value.and_then(Value::as_object);
    Specs {
        composition: scalar(obj, "composition"),
        durability: scalar(obj, "durability"),
        usage: scalar(obj, "usage"),
        weight: scalar(obj, "weight"),
    }
}

fn canonical_variants(obj: Option<&Map<String, Value>>) -> Vec<ColorVariant> {
    if let Some(Value::Array(items)) = obj.and_then(|m| m.get("variants")) {
        return items
            .iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(ColorVariant::new(
                    scalar(Some(m), "name"),
                    scalar(Some(m), "image"),
                )),
                Value::String(name) => Some(ColorVariant::new(name.clone(), String::new())),
                _ => None,
            })
            .collect();
    }

    // 旧形式: 名前リスト + 名前→画像マップ
    let names: Vec<String> = match obj.and_then(|m| m.get("colors")) {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    };
    let images = obj
        .and_then(|m| m.get("colorImages"))
        .and_then(Value::as_object);

    let mut variants: Vec<ColorVariant> = names
        .iter()
        .map(|name| {
            let image = images
                .and_then(|m| m.get(name))
                .map(value_to_string)
                .unwrap_or_default();
            ColorVariant::new(name.clone(), image)
        })
        .collect();

    // マップにしかない画像も捨てずに残す
    if let Some(map) = images {
        for (name, image) in map {
            if !names.iter().any(|n| n == name) {
                variants.push(ColorVariant::new(name.clone(), value_to_string(image)));
            }
        }
    }

    variants
}

/// カタログエントリを正規化
pub fn canonicalize_item(doc: &Value) -> CatalogItem {
    let obj = doc.as_object();
    CatalogItem {
        id: scalar(obj, "id"),
        name: scalar(obj, "name"),
        supplier: scalar(obj, "supplier"),
        catalog: scalar(obj, "catalog"),
        summary: first_scalar(obj, &["summary", "technicalSummary"]),
        specs: canonical_specs(obj.and_then(|m| m.get("specs"))),
        variants: canonical_variants(obj),
        main_image: first_scalar(obj, &["mainImage", "image"]),
        spec_image: scalar(obj, "specImage"),
        spec_document: first_scalar(obj, &["specDocument", "pdfUrl"]),
        category: Category::from_label(&scalar(obj, "category")),
    }
}

/// 家具テンプレートを正規化
pub fn canonicalize_template(doc: &Value) -> FurnitureTemplate {
    let obj = doc.as_object();
    FurnitureTemplate {
        id: scalar(obj, "id"),
        name: scalar(obj, "name"),
        category: scalar(obj, "category"),
        supplier: scalar(obj, "supplier"),
        image: first_scalar(obj, &["image", "imageUrl"]),
        collection: scalar(obj, "collection"),
        ephemeral: false,
    }
}

impl Record for CatalogItem {
    const COLLECTION: &'static str = "fabrics";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: &Value) -> Self {
        canonicalize_item(doc)
    }

    fn to_document(&self) -> Value {
        let variants: Vec<Value> = self
            .variants
            .iter()
            .map(|v| json!({ "name": v.name, "image": v.image }))
            .collect();

        json!({
            "id": self.id,
            "name": self.name,
            "supplier": self.supplier,
            "catalog": self.catalog,
            "summary": self.summary,
            "specs": {
                "composition": self.specs.composition,
                "durability": self.specs.durability,
                "usage": self.specs.usage,
                "weight": self.specs.weight,
            },
            "variants": variants,
            "mainImage": self.main_image,
            "specImage": self.spec_image,
            "specDocument": self.spec_document,
            "category": self.category.as_str(),
        })
    }

    fn has_embedded_image(&self) -> bool {
        CatalogItem::has_embedded_image(self)
    }
}

impl Record for FurnitureTemplate {
    const COLLECTION: &'static str = "furniture";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_document(doc: &Value) -> Self {
        canonicalize_template(doc)
    }

    fn to_document(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "category": self.category,
            "supplier": self.supplier,
            "image": self.image,
            "collection": self.collection,
        })
    }

    fn has_embedded_image(&self) -> bool {
        crate::data_url::is_data_url(&self.image)
    }
}
