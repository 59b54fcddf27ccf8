//! 画像の正規化
//!
//! 任意の入力画像を、長辺を上限以下に縮小したJPEGのData URLにする。
//! - 縦横比は維持、上限より小さい画像は拡大しない
//! - 透過部分は白背景に合成してから再エンコード
//!
//! PDFは正規化せず、そのままBase64のData URLとして持つ。

pub mod resolver;

pub use resolver::RemoteResolver;

use crate::error::{CatalogError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fabric_catalog_common::to_data_url;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 縮小上限とJPEG品質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBudget {
    pub max_dimension: u32,
    /// JPEG品質 (1-100)
    pub quality: u8,
}

/// 用途別の画像プリセット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImagePreset {
    /// カタログ一覧・カラーバリエーション: 600px, 80%
    #[default]
    Thumbnail,
    /// 仕様書画像: 1600px, 90%
    Sheet,
    /// 家具写真・合成結果: 2048px, 90%
    Hero,
}

impl ImagePreset {
    pub fn default_budget(&self) -> ImageBudget {
        match self {
            ImagePreset::Thumbnail => ImageBudget { max_dimension: 600, quality: 80 },
            ImagePreset::Sheet => ImageBudget { max_dimension: 1600, quality: 90 },
            ImagePreset::Hero => ImageBudget { max_dimension: 2048, quality: 90 },
        }
    }
}

/// 正規化済み画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// 縮小後のサイズ（長辺を上限に合わせる、拡大はしない）
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let scale = max_dimension as f64 / longest as f64;
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}

/// 透過を白背景に合成してRGBにする
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    rgb
}

/// バイト列を正規化
///
/// `label` はエラーメッセージ用（ファイル名やURL）
pub fn normalize_bytes(bytes: &[u8], budget: ImageBudget, label: &str) -> Result<NormalizedImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| CatalogError::image(label, e))?;

    let (width, height) = decoded.dimensions();
    let (target_w, target_h) = target_dimensions(width, height, budget.max_dimension);
    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };

    let rgb = flatten_on_white(&resized);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, budget.quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CatalogError::image(label, e))?;

    Ok(NormalizedImage {
        data_url: to_data_url("image/jpeg", &STANDARD.encode(&buffer)),
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// ファイルを読み込んで正規化
pub fn normalize_file(path: &Path, budget: ImageBudget) -> Result<NormalizedImage> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    normalize_bytes(&bytes, budget, &label)
}

/// 正規化をブロッキングスレッドで実行（ランタイムを止めない）
pub async fn normalize_file_async(path: &Path, budget: ImageBudget) -> Result<NormalizedImage> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || normalize_file(&owned, budget))
        .await
        .map_err(|e| CatalogError::image(path.display().to_string(), e))?
}

/// Base64化したPDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub data_url: String,
    pub size_bytes: u64,
    /// 警告しきい値を超えている（取込には確認が必要）
    pub oversized: bool,
}

/// PDFをそのままData URLにする
pub fn encode_document(path: &Path, warn_threshold_bytes: u64) -> Result<EncodedDocument> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let size_bytes = bytes.len() as u64;

    Ok(EncodedDocument {
        data_url: to_data_url("application/pdf", &STANDARD.encode(&bytes)),
        size_bytes,
        oversized: size_bytes > warn_threshold_bytes,
    })
}
