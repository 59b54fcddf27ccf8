//! AIレスポンスパーサー
//!
//! 生成AIのテキスト応答からJSONを取り出し、仕様書の抽出結果にする。
//! 応答は構造化されている保証がないので、欠けたフィールドは空文字で埋める。

use crate::canonical::canonicalize_item;
use crate::error::{Error, Result};
use crate::types::ExtractedDetails;
use serde_json::Value;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト または [...] 配列（先に現れる方）
/// 3. エラー
///
/// # Examples
/// ```
/// use fabric_catalog_common::extract_json;
///
/// let response = "結果: {\"name\": \"Lino\"}";
/// assert_eq!(extract_json(response).unwrap(), "{\"name\": \"Lino\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    let object = response.find('{').zip(response.rfind('}'));
    let array = response.find('[').zip(response.rfind(']'));

    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if o.0 < a.0 { o } else { a }),
        (o, a) => o.or(a),
    };

    match span {
        Some((start, end)) if end >= start => Ok(&response[start..=end]),
        _ => Err(Error::Parse("JSONが見つかりません".into())),
    }
}

/// 仕様書抽出レスポンスをパース
///
/// オブジェクト、または配列の先頭要素を採用する。
pub fn parse_extraction_response(response: &str) -> Result<ExtractedDetails> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("抽出結果のJSONパースエラー: {}", e)))?;

    let obj = match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };

    if !obj.is_object() {
        return Err(Error::Parse("JSONオブジェクトが見つかりません".into()));
    }

    // 正規化と同じホワイトリストで読む
    let item = canonicalize_item(&obj);
    Ok(ExtractedDetails {
        name: item.name,
        supplier: item.supplier,
        summary: item.summary,
        specs: item.specs,
    })
}
