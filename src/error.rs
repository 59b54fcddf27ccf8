use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`fabric-catalog config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    #[error("ストアURLが設定されていません。`fabric-catalog config --set-store-url URL` で設定してください")]
    MissingStoreUrl,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像処理エラー ({file}): {reason}")]
    ImageProcessing { file: String, reason: String },

    #[error("PDFの取込を中止しました: {0}")]
    DocumentRejected(String),

    #[error("リモート画像を取得できません: {0}。ローカルの画像をアップロードしてください")]
    RemoteFetch(String),

    #[error("ストアエラー: {0}")]
    Store(#[from] StoreError),

    #[error("AIサービスが利用できません: {0}")]
    AiService(String),

    #[error("メイン画像がありません: {0}")]
    MissingMainImage(String),

    #[error("保存が途中で失敗しました（{committed}/{intended}件保存済み）: {source}")]
    PartialCommit {
        committed: usize,
        intended: usize,
        source: StoreError,
    },

    #[error("キャンセルされました（{committed}/{intended}件保存済み）")]
    Cancelled { committed: usize, intended: usize },

    #[error("下書きが見つかりません: {0}")]
    DraftNotFound(String),

    #[error("バリエーションが見つかりません: {0}")]
    VariantNotFound(String),

    #[error("レコードが見つかりません: {0}")]
    RecordNotFound(String),

    #[error("アクセスコードが一致しません")]
    AccessDenied,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] fabric_catalog_common::Error),
}

impl CatalogError {
    pub fn image(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        CatalogError::ImageProcessing {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
