//! 生成AI連携
//!
//! - 仕様書（PDF/画像）からの情報抽出
//! - プロンプトからの画像生成（家具テンプレート）
//! - 家具写真と生地画像の合成（張り替えビジュアライザ）
//!
//! 失敗はすべて `AiService` にまとめ、利用者には一般的なメッセージだけを出す。

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use crate::imaging::resolver::ResolvedImage;
use async_trait::async_trait;
use fabric_catalog_common::ExtractedDetails;

/// 生成画像の縦横比
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Square,
    Portrait,
    Landscape,
    Tall,
    Wide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1:1" | "square" => Ok(AspectRatio::Square),
            "3:4" | "portrait" => Ok(AspectRatio::Portrait),
            "4:3" | "landscape" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Tall),
            "16:9" => Ok(AspectRatio::Wide),
            _ => Err(format!("Unknown aspect ratio: {}. Use 1:1, 3:4, 4:3, 9:16, or 16:9", s)),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 生成画像の解像度
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    OneK,
    TwoK,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1K" => Ok(Resolution::OneK),
            "2K" => Ok(Resolution::TwoK),
            _ => Err(format!("Unknown resolution: {}. Use 1K or 2K", s)),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[async_trait]
pub trait ImageAi: Send + Sync {
    /// 仕様書から名称・仕入先・概要・仕様を読み取る
    async fn extract_details(&self, document: &ResolvedImage) -> Result<ExtractedDetails>;

    async fn synthesize_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
    ) -> Result<ResolvedImage>;

    /// `subject` に `material` を適用した画像を生成する
    async fn compose(
        &self,
        subject: &ResolvedImage,
        material: &ResolvedImage,
        instruction: &str,
    ) -> Result<ResolvedImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_from_str() {
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Wide));
        assert_eq!("3:4".parse::<AspectRatio>(), Ok(AspectRatio::Portrait));
        assert!("2:1".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_resolution_round_trip() {
        for r in [Resolution::OneK, Resolution::TwoK] {
            assert_eq!(r.to_string().parse::<Resolution>(), Ok(r));
        }
        assert_eq!("2k".parse::<Resolution>(), Ok(Resolution::TwoK));
    }
}
