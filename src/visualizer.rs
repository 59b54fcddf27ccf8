//! 張り替えビジュアライザ
//!
//! 家具写真と生地画像をAIに渡して、生地を張り替えた写真を生成する。

use crate::ai::ImageAi;
use crate::error::{CatalogError, Result};
use crate::imaging::resolver::{is_remote_url, RemoteResolver, ResolvedImage};
use crate::imaging::ImageBudget;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fabric_catalog_common::{build_composition_prompt, is_data_url, to_display_name, CatalogItem, FurnitureTemplate};
use std::path::Path;

/// ローカルファイルからセッション限りの家具テンプレートを作る
pub fn ephemeral_template(path: &Path) -> FurnitureTemplate {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    FurnitureTemplate {
        id: format!("local:{}", file_name),
        name: to_display_name(&file_name),
        image: path.display().to_string(),
        ephemeral: true,
        ..Default::default()
    }
}

/// `--furniture` の指定（テンプレートID / URL / ローカルパス）を解決
pub fn select_furniture(reference: &str, templates: &[FurnitureTemplate]) -> Result<FurnitureTemplate> {
    if let Some(template) = templates.iter().find(|t| t.id == reference) {
        return Ok(template.clone());
    }
    if is_remote_url(reference) || is_data_url(reference) {
        return Ok(FurnitureTemplate {
            id: "remote".into(),
            name: "Furniture".into(),
            image: reference.to_string(),
            ephemeral: true,
            ..Default::default()
        });
    }
    let path = Path::new(reference);
    if path.is_file() {
        return Ok(ephemeral_template(path));
    }
    Err(CatalogError::RecordNotFound(reference.to_string()))
}

/// 合成に使う生地画像（バリエーション指定がなければメイン画像）
pub fn fabric_image<'a>(fabric: &'a CatalogItem, variant: Option<&str>) -> Result<&'a str> {
    match variant {
        Some(name) => fabric
            .variant_image(name)
            .filter(|image| !image.is_empty())
            .ok_or_else(|| CatalogError::VariantNotFound(name.to_string())),
        None if fabric.has_main_image() => Ok(&fabric.main_image),
        None => Err(CatalogError::MissingMainImage(fabric.name.clone())),
    }
}

pub struct Visualizer<'a> {
    ai: &'a dyn ImageAi,
    resolver: &'a RemoteResolver,
    budget: ImageBudget,
}

impl<'a> Visualizer<'a> {
    pub fn new(ai: &'a dyn ImageAi, resolver: &'a RemoteResolver, budget: ImageBudget) -> Self {
        Self { ai, resolver, budget }
    }

    pub async fn render(
        &self,
        furniture: &FurnitureTemplate,
        fabric: &CatalogItem,
        variant: Option<&str>,
    ) -> Result<ResolvedImage> {
        let material_ref = fabric_image(fabric, variant)?;

        let subject = self.resolver.resolve(&furniture.image, self.budget).await?;
        let material = self.resolver.resolve(material_ref, self.budget).await?;
        let prompt = build_composition_prompt(&furniture.name, &fabric.name, variant);

        tracing::info!(furniture = %furniture.name, fabric = %fabric.name, variant = ?variant, "Composing visualization");
        self.ai.compose(&subject, &material, &prompt).await
    }
}

/// 生成画像をJPEGで書き出す
pub fn write_jpeg(image: &ResolvedImage, output: &Path) -> Result<()> {
    let bytes = STANDARD
        .decode(image.base64.as_bytes())
        .map_err(|e| CatalogError::image(output.display().to_string(), e))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if image.mime_type == "image/jpeg" {
        std::fs::write(output, bytes)?;
        return Ok(());
    }

    image::load_from_memory(&bytes)
        .map_err(|e| CatalogError::image(output.display().to_string(), e))?
        .to_rgb8()
        .save_with_format(output, image::ImageFormat::Jpeg)
        .map_err(|e| CatalogError::image(output.display().to_string(), e))
}
