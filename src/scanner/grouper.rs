//! フォルダ単位のグループ化
//!
//! 相対パスの直上のフォルダごとに1エントリの候補をつくり、各ファイルを分類する。
//! - 仕様書キーワードを含むPDF → 仕様書PDF
//! - 仕様書キーワードを含む画像 → 仕様書画像
//! - その他の画像 → カラーバリエーション候補
//!
//! バリエーション候補が1つもないグループは出力しない。

use super::{FileKind, SourceFile};
use fabric_catalog_common::{folder_display_name, is_hidden, is_spec_artifact, to_display_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCandidate {
    /// 表示名（ファイル名から生成）
    pub name: String,
    pub file: SourceFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    /// フォルダの相対パス
    pub folder: String,
    /// 表示名（フォルダ名から生成）
    pub name: String,
    pub variants: Vec<VariantCandidate>,
    pub spec_image: Option<SourceFile>,
    pub spec_document: Option<SourceFile>,
}

/// `dir/sub/file.jpg` → (`dir/sub`, `sub`, `file.jpg`)
fn split_relative(relative: &str) -> Option<(&str, &str, &str)> {
    let relative = relative.trim_matches('/');
    let (folder, file_name) = relative.rsplit_once('/')?;
    if folder.is_empty() || file_name.is_empty() {
        return None;
    }
    let folder_name = folder.rsplit('/').next().unwrap_or(folder);
    Some((folder, folder_name, file_name))
}

pub fn group_by_folder(files: &[SourceFile]) -> Vec<FolderGroup> {
    let mut groups: Vec<FolderGroup> = Vec::new();

    for file in files {
        let Some((folder, folder_name, file_name)) = file.relative_path.as_deref().and_then(split_relative) else {
            tracing::debug!(file = %file.file_name, "No folder in relative path, dropped");
            continue;
        };
        if is_hidden(file_name) || file.kind == FileKind::Other {
            continue;
        }

        let index = match groups.iter().position(|g| g.folder == folder) {
            Some(i) => i,
            None => {
                groups.push(FolderGroup {
                    folder: folder.to_string(),
                    name: folder_display_name(folder_name),
                    variants: Vec::new(),
                    spec_image: None,
                    spec_document: None,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];

        match (file.kind, is_spec_artifact(file_name)) {
            (FileKind::Pdf, true) => group.spec_document = Some(file.clone()),
            (FileKind::Image, true) => group.spec_image = Some(file.clone()),
            (FileKind::Image, false) => group.variants.push(VariantCandidate {
                name: to_display_name(file_name),
                file: file.clone(),
            }),
            _ => {}
        }
    }

    groups.retain(|g| {
        if g.variants.is_empty() {
            tracing::debug!(folder = %g.folder, "No color variants, group discarded");
        }
        !g.variants.is_empty()
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(relative: &str, kind: FileKind) -> SourceFile {
        let file_name = relative.rsplit('/').next().unwrap_or(relative).to_string();
        SourceFile {
            path: PathBuf::from("/tmp").join(relative),
            file_name,
            relative_path: Some(relative.to_string()),
            kind,
        }
    }

    #[test]
    fn test_model_folder_grouping() {
        let files = vec![
            file("Catalogo/ModelA/red.jpg", FileKind::Image),
            file("Catalogo/ModelA/blue.jpg", FileKind::Image),
            file("Catalogo/ModelA/spec-sheet.pdf", FileKind::Pdf),
        ];

        let groups = group_by_folder(&files);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.name, "Modela");
        let names: Vec<_> = group.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Red", "Blue"]);
        assert_eq!(
            group.spec_document.as_ref().map(|f| f.file_name.as_str()),
            Some("spec-sheet.pdf")
        );
        assert!(group.spec_image.is_none());
    }

    #[test]
    fn test_spec_image_is_not_a_variant() {
        let files = vec![
            file("Velvet/ficha_tecnica.jpg", FileKind::Image),
            file("Velvet/grey.png", FileKind::Image),
        ];
        let groups = group_by_folder(&files);
        assert_eq!(groups[0].variants.len(), 1);
        assert_eq!(groups[0].variants[0].name, "Grey");
        assert!(groups[0].spec_image.is_some());
    }

    #[test]
    fn test_group_without_variants_discarded() {
        let files = vec![
            file("OnlySpec/datasheet.pdf", FileKind::Pdf),
            file("OnlySpec/technical.png", FileKind::Image),
            file("Notes/readme.txt", FileKind::Other),
        ];
        assert!(group_by_folder(&files).is_empty());
    }

    #[test]
    fn test_hidden_and_rootless_files_skipped() {
        let mut loose = file("loose.jpg", FileKind::Image);
        loose.relative_path = Some("loose.jpg".into());
        let mut flat = file("flat.jpg", FileKind::Image);
        flat.relative_path = None;

        let files = vec![
            loose,
            flat,
            file("Linen/.DS_Store", FileKind::Image),
            file("Linen/._sand.jpg", FileKind::Image),
            file("Linen/sand.jpg", FileKind::Image),
        ];

        let groups = group_by_folder(&files);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].variants.len(), 1);
        assert_eq!(groups[0].variants[0].name, "Sand");
    }

    #[test]
    fn test_last_spec_artifact_wins() {
        let files = vec![
            file("Boucle/spec-a.pdf", FileKind::Pdf),
            file("Boucle/cream.jpg", FileKind::Image),
            file("Boucle/spec-b.pdf", FileKind::Pdf),
        ];
        let groups = group_by_folder(&files);
        assert_eq!(
            groups[0].spec_document.as_ref().map(|f| f.file_name.as_str()),
            Some("spec-b.pdf")
        );
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let files = vec![
            file("Root/Zeta/a.jpg", FileKind::Image),
            file("Root/Alpha/b.jpg", FileKind::Image),
            file("Root/Zeta/c.jpg", FileKind::Image),
        ];
        let groups = group_by_folder(&files);
        let folders: Vec<_> = groups.iter().map(|g| g.folder.as_str()).collect();
        assert_eq!(folders, vec!["Root/Zeta", "Root/Alpha"]);
        assert_eq!(groups[0].variants.len(), 2);
    }

    #[test]
    fn test_same_folder_name_under_different_parents() {
        let files = vec![
            file("Root/Sofa/Red/a.jpg", FileKind::Image),
            file("Root/Chair/Red/b.jpg", FileKind::Image),
        ];
        let groups = group_by_folder(&files);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.name == "Red"));
    }
}
