//! ファイル名・フォルダ名から表示名を作るルール

/// 仕様書とみなすファイル名キーワード（小文字で比較）
pub const SPEC_KEYWORDS: &[&str] = &[
    "ficha",
    "tecnica",
    "técnica",
    "technical",
    "sheet",
    "spec",
    "data",
];

/// 拡張子を取り除く（先頭のドットは拡張子とみなさない）
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    }
}

/// 先頭1文字を大文字、残りを小文字にする
fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn separators_to_spaces(text: &str) -> String {
    text.chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect()
}

/// ファイル名から表示名を作る
///
/// ```
/// use fabric_catalog_common::to_display_name;
///
/// assert_eq!(to_display_name("blue_velvet-01.jpg"), "Blue velvet 01");
/// ```
pub fn to_display_name(file_name: &str) -> String {
    sentence_case(separators_to_spaces(strip_extension(file_name)).trim())
}

/// フォルダ名から表示名を作る（拡張子の除去はしない）
pub fn folder_display_name(folder_name: &str) -> String {
    sentence_case(separators_to_spaces(folder_name).trim())
}

/// 隠しファイル（`.DS_Store` など）
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// ファイル名に仕様書キーワードが含まれるか
pub fn is_spec_artifact(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SPEC_KEYWORDS.iter().any(|k| lower.contains(k))
}
