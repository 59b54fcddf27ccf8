//! Data URLのユーティリティ

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    if !is_data_url(data_url) {
        return None;
    }
    data_url.split_once(',').map(|(_, data)| data)
}

/// Data URLからMIMEタイプを抽出
///
/// 抽出失敗時は"image/jpeg"をデフォルトとして返す
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .strip_prefix("data:")
        .and_then(|s| s.split(';').next())
        .filter(|s| !s.is_empty() && !s.contains(','))
        .unwrap_or("image/jpeg")
}

/// Base64データからData URLを組み立てる
pub fn to_data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// 埋め込みデータ（Data URL）かどうか
pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:") && value.contains(";base64,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_base64_from_data_url_jpeg() {
        let data_url = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        assert_eq!(extract_base64_from_data_url(data_url), Some("/9j/4AAQSkZJRg=="));
    }

    #[test]
    fn test_extract_base64_from_data_url_invalid() {
        assert_eq!(extract_base64_from_data_url("https://example.com/a.jpg"), None);
        assert_eq!(extract_base64_from_data_url(""), None);
    }

    #[test]
    fn test_extract_mime_type() {
        assert_eq!(extract_mime_type_from_data_url("data:image/png;base64,iVBORw0KGgo="), "image/png");
        assert_eq!(
            extract_mime_type_from_data_url("data:application/pdf;base64,JVBERi0="),
            "application/pdf"
        );
        assert_eq!(extract_mime_type_from_data_url("not a data url"), "image/jpeg");
    }

    #[test]
    fn test_to_data_url() {
        let url = to_data_url("image/jpeg", "AAAA");
        assert_eq!(url, "data:image/jpeg;base64,AAAA");
        assert!(is_data_url(&url));
    }
}
