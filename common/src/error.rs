//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = Error::Config("アクセスコードは4桁の数字です".to_string());
        let display = format!("{}", error);
        assert_eq!(display, "Config error: アクセスコードは4桁の数字です");
    }

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse("JSONが見つかりません".to_string());
        assert_eq!(format!("{}", error), "Parse error: JSONが見つかりません");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
