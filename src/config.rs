use crate::error::{CatalogError, Result};
use crate::imaging::{ImageBudget, ImagePreset};
use crate::store::BatchOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_STORE_URL: &str = "FABRIC_STORE_URL";
pub const ENV_STORE_TOKEN: &str = "FABRIC_STORE_TOKEN";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_LAUNCH_CODE: &str = "FABRIC_LAUNCH_CODE";
pub const ENV_UPLOAD_CODE: &str = "FABRIC_UPLOAD_CODE";

/// 用途別の画像上限（設定ファイルで上書き可能）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetBudgets {
    pub thumbnail: ImageBudget,
    pub sheet: ImageBudget,
    pub hero: ImageBudget,
}

impl Default for PresetBudgets {
    fn default() -> Self {
        Self {
            thumbnail: ImagePreset::Thumbnail.default_budget(),
            sheet: ImagePreset::Sheet.default_budget(),
            hero: ImagePreset::Hero.default_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_url: Option<String>,
    pub store_token: Option<String>,
    pub api_key: Option<String>,
    /// 仕様書抽出用のモデル
    pub model: String,
    /// 画像生成・合成用のモデル
    pub image_model: String,
    /// リモート画像取得に使うCORSリレー（`url` クエリで対象を渡す）
    pub cors_relay_url: Option<String>,
    pub launch_code: Option<String>,
    pub upload_code: Option<String>,
    /// ロック時の通知先
    pub notify_url: Option<String>,
    pub batch: BatchOptions,
    pub presets: PresetBudgets,
    /// これを超えるPDFは取込前に確認する（バイト）
    pub pdf_warn_bytes: u64,
    /// ファイル一覧アップロードの上限件数
    pub bulk_file_cap: usize,
    pub cache_path: Option<PathBuf>,
    pub drafts_path: Option<PathBuf>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_token: None,
            api_key: None,
            model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image".into(),
            cors_relay_url: None,
            launch_code: None,
            upload_code: None,
            notify_url: None,
            batch: BatchOptions::default(),
            presets: PresetBudgets::default(),
            pdf_warn_bytes: 1_000_000,
            bulk_file_cap: 50,
            cache_path: None,
            drafts_path: None,
            timeout_seconds: 120,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CatalogError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fabric-catalog").join("config.json"))
    }

    fn data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|d| d.join("fabric-catalog"))
            .ok_or_else(|| CatalogError::Config("データディレクトリが見つかりません".into()))
    }

    // 環境変数を優先

    pub fn get_store_url(&self) -> Result<String> {
        env_value(ENV_STORE_URL)
            .or_else(|| self.store_url.clone())
            .ok_or(CatalogError::MissingStoreUrl)
    }

    pub fn get_store_token(&self) -> Option<String> {
        env_value(ENV_STORE_TOKEN).or_else(|| self.store_token.clone())
    }

    pub fn get_api_key(&self) -> Result<String> {
        env_value(ENV_API_KEY)
            .or_else(|| self.api_key.clone())
            .ok_or(CatalogError::MissingApiKey)
    }

    pub fn get_launch_code(&self) -> Option<String> {
        env_value(ENV_LAUNCH_CODE).or_else(|| self.launch_code.clone())
    }

    pub fn get_upload_code(&self) -> Option<String> {
        env_value(ENV_UPLOAD_CODE).or_else(|| self.upload_code.clone())
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::data_dir()?.join(crate::cache::CACHE_FILE_NAME)),
        }
    }

    pub fn drafts_path(&self) -> Result<PathBuf> {
        match &self.drafts_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::data_dir()?.join(crate::ingest::drafts::DRAFTS_FILE_NAME)),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn budget(&self, preset: ImagePreset) -> ImageBudget {
        match preset {
            ImagePreset::Thumbnail => self.presets.thumbnail,
            ImagePreset::Sheet => self.presets.sheet,
            ImagePreset::Hero => self.presets.hero,
        }
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_store_url(&mut self, url: String) -> Result<()> {
        self.store_url = Some(url.trim_end_matches('/').to_string());
        self.save()
    }

    pub fn set_store_token(&mut self, token: String) -> Result<()> {
        self.store_token = Some(token);
        self.save()
    }

    pub fn set_relay_url(&mut self, url: String) -> Result<()> {
        self.cors_relay_url = Some(url);
        self.save()
    }

    pub fn set_notify_url(&mut self, url: String) -> Result<()> {
        self.notify_url = Some(url);
        self.save()
    }

    /// アクセスコードを設定（4桁の数字のみ）
    pub fn set_launch_code(&mut self, code: String) -> Result<()> {
        fabric_catalog_common::AccessGate::new(&code)?;
        self.launch_code = Some(code.trim().to_string());
        self.save()
    }

    pub fn set_upload_code(&mut self, code: String) -> Result<()> {
        fabric_catalog_common::AccessGate::new(&code)?;
        self.upload_code = Some(code.trim().to_string());
        self.save()
    }
}
