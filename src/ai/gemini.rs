//! Gemini API連携（generateContent）

use super::{AspectRatio, ImageAi, Resolution};
use crate::error::{CatalogError, Result};
use crate::imaging::resolver::ResolvedImage;
use async_trait::async_trait;
use fabric_catalog_common::{build_extraction_prompt, parse_extraction_response, ExtractedDetails};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    fn image(image: &ResolvedImage) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.base64.clone(),
            },
        }
    }
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<String>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "imageSize")]
    image_size: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data", default)]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize)]
struct ResponseInlineData {
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> Option<String> {
        let text: Vec<&str> = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join(""))
        }
    }

    fn first_image(&self) -> Option<ResolvedImage> {
        self.parts().filter_map(|p| p.inline_data.as_ref()).next().map(|d| ResolvedImage {
            mime_type: if d.mime_type.is_empty() {
                "image/png".to_string()
            } else {
                d.mime_type.clone()
            },
            base64: d.data.clone(),
        })
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, text_model: String, image_model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            text_model,
            image_model,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, model)
    }

    /// Gemini API呼び出し（共通処理）
    async fn call(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(model, error = %e, "Gemini request failed");
                CatalogError::AiService("接続できません".into())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model, status = status.as_u16(), body = %body.chars().take(300).collect::<String>(), "Gemini API error");
            return Err(CatalogError::AiService(format!("API error: {}", status.as_u16())));
        }

        response.json::<GeminiResponse>().await.map_err(|e| {
            tracing::warn!(model, error = %e, "Gemini response unreadable");
            CatalogError::AiService("応答を読み取れません".into())
        })
    }

    fn image_request(parts: Vec<Part>, image_config: Option<ImageConfig>) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config,
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl ImageAi for GeminiClient {
    async fn extract_details(&self, document: &ResolvedImage) -> Result<ExtractedDetails> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part::text(build_extraction_prompt()), Part::image(document)],
            }],
            generation_config: GenerationConfig {
                temperature: Some(0.1),
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            },
        };

        let response = self.call(&self.text_model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| CatalogError::AiService("Empty response".into()))?;

        parse_extraction_response(&text).map_err(|e| {
            tracing::warn!(error = %e, "Extraction response not parseable");
            CatalogError::AiService("抽出結果を解釈できません".into())
        })
    }

    async fn synthesize_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
    ) -> Result<ResolvedImage> {
        let request = Self::image_request(
            vec![Part::text(prompt)],
            Some(ImageConfig {
                aspect_ratio: aspect_ratio.as_str().to_string(),
                image_size: resolution.as_str().to_string(),
            }),
        );

        self.call(&self.image_model, &request)
            .await?
            .first_image()
            .ok_or_else(|| CatalogError::AiService("画像が生成されませんでした".into()))
    }

    async fn compose(
        &self,
        subject: &ResolvedImage,
        material: &ResolvedImage,
        instruction: &str,
    ) -> Result<ResolvedImage> {
        let request = Self::image_request(
            vec![Part::text(instruction), Part::image(subject), Part::image(material)],
            None,
        );

        self.call(&self.image_model, &request)
            .await?
            .first_image()
            .ok_or_else(|| CatalogError::AiService("画像が生成されませんでした".into()))
    }
}
