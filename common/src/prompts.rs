//! プロンプト生成モジュール
//!
//! - build_extraction_prompt: 仕様書（PDF/画像）からの情報抽出
//! - build_composition_prompt: 家具写真への生地の張り替え合成
//! - build_template_prompt: 家具テンプレート画像の生成

/// 仕様書抽出プロンプト
pub fn build_extraction_prompt() -> String {
    r#"You are cataloguing upholstery fabrics for a furniture showroom.
Read the attached technical sheet and extract the product information.

## Output format (JSON object only, no prose)
{
  "name": "commercial name of the fabric",
  "supplier": "manufacturer or distributor",
  "summary": "one or two sentences describing the fabric and its best use",
  "specs": {
    "composition": "fibre composition, e.g. 100% polyester",
    "durability": "abrasion resistance, e.g. 50,000 Martindale",
    "usage": "recommended usage class (domestic, contract, outdoor...)",
    "weight": "weight per square metre or linear metre"
  }
}

Use an empty string for anything the sheet does not state. Do not invent values."#
        .to_string()
}

/// 張り替え合成プロンプト
///
/// # Arguments
/// * `furniture_name` - 家具の名前
/// * `fabric_name` - 生地の名前
/// * `variant` - カラーバリエーション名（ない場合は生地のメイン画像）
pub fn build_composition_prompt(furniture_name: &str, fabric_name: &str, variant: Option<&str>) -> String {
    let fabric = match variant {
        Some(color) if !color.is_empty() => format!("{} in the colour {}", fabric_name, color),
        _ => fabric_name.to_string(),
    };

    format!(
        r#"The first image is a piece of furniture ({furniture_name}). The second image is a fabric swatch ({fabric}).
Reupholster every upholstered surface of the furniture with the fabric from the second image.
Keep the furniture shape, legs, frame, background, lighting and camera angle exactly as they are.
Match the fabric texture scale to the size of the furniture and follow the folds and seams naturally.
Return only the edited photograph."#
    )
}

/// 家具テンプレート画像生成プロンプト
pub fn build_template_prompt(description: &str, category: &str) -> String {
    let category = if category.trim().is_empty() {
        "furniture".to_string()
    } else {
        category.trim().to_lowercase()
    };

    format!(
        "Studio product photograph of a {category}: {description}. \
         Neutral light grey background, soft even lighting, full piece visible, \
         upholstered in plain off-white fabric so it can be reupholstered later."
    )
}
