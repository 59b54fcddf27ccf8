pub mod grouper;

pub use grouper::{group_by_folder, FolderGroup, VariantCandidate};

use crate::error::{CatalogError, Result};
use fabric_catalog_common::is_hidden;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// ファイルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Other,
}

/// 取込対象のファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    /// 取込ルートのフォルダ名から始まる `/` 区切りの相対パス（フォルダ取込のみ）
    pub relative_path: Option<String>,
    pub kind: FileKind,
}

impl SourceFile {
    pub fn new(path: PathBuf, relative_path: Option<String>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let kind = detect_kind(&path);
        Self {
            path,
            file_name,
            relative_path,
            kind,
        }
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

fn kind_from_extension(path: &Path) -> FileKind {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Image
    } else if ext == "pdf" {
        FileKind::Pdf
    } else {
        FileKind::Other
    }
}

/// 中身（マジックバイト）で判定し、判定できなければ拡張子で判定
pub fn detect_kind(path: &Path) -> FileKind {
    match infer::get_from_path(path) {
        Ok(Some(kind)) if kind.matcher_type() == infer::MatcherType::Image => FileKind::Image,
        Ok(Some(kind)) if kind.mime_type() == "application/pdf" => FileKind::Pdf,
        Ok(Some(_)) => FileKind::Other,
        _ => kind_from_extension(path),
    }
}

/// フォルダを再帰的にスキャン
///
/// 相対パスにはルートフォルダ名を含める（`Catalogo/ModelA/red.jpg`）。
/// 隠しフォルダは辿らない。結果はファイル名順で、入力順として扱われる。
pub fn scan_tree(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(CatalogError::FolderNotFound(root.display().to_string()));
    }

    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| root.display().to_string());

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_hidden(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .ok()
            .map(|rel| {
                let mut segments = vec![root_name.clone()];
                segments.extend(rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()));
                segments.join("/")
            });

        files.push(SourceFile::new(entry.path().to_path_buf(), relative));
    }

    tracing::debug!(root = %root.display(), files = files.len(), "Folder scanned");
    Ok(files)
}

/// 個別に指定されたファイル（相対パスなし）
///
/// 見つからないパスは結果から外し、エラーとして別に返す。
pub fn scan_files(paths: &[PathBuf]) -> (Vec<SourceFile>, Vec<CatalogError>) {
    let mut files = Vec::with_capacity(paths.len());
    let mut missing = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(SourceFile::new(path.clone(), None));
        } else {
            missing.push(CatalogError::FileNotFound(path.display().to_string()));
        }
    }
    (files, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(kind_from_extension(Path::new("a.JPG")), FileKind::Image);
        assert_eq!(kind_from_extension(Path::new("a.webp")), FileKind::Image);
        assert_eq!(kind_from_extension(Path::new("ficha.PDF")), FileKind::Pdf);
        assert_eq!(kind_from_extension(Path::new("notes.txt")), FileKind::Other);
        assert_eq!(kind_from_extension(Path::new("README")), FileKind::Other);
    }

    #[test]
    fn test_detect_kind_prefers_content() {
        let dir = tempdir().unwrap();
        // 拡張子はtxtだが中身はPNG
        let path = dir.path().join("swatch.txt");
        image::RgbImage::new(2, 2)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        assert_eq!(detect_kind(&path), FileKind::Image);

        let pdf = dir.path().join("sheet.bin");
        fs::write(&pdf, b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n").unwrap();
        assert_eq!(detect_kind(&pdf), FileKind::Pdf);
    }

    #[test]
    fn test_scan_tree_not_found() {
        let result = scan_tree(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(CatalogError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_tree_relative_paths() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Catalogo");
        fs::create_dir_all(root.join("ModelB")).unwrap();
        fs::create_dir_all(root.join("ModelA")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        File::create(root.join("ModelB/green.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(root.join("ModelA/red.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(root.join(".git/config")).unwrap();

        let files = scan_tree(&root).unwrap();
        let relative: Vec<_> = files.iter().filter_map(|f| f.relative_path.as_deref()).collect();
        assert_eq!(relative, vec!["Catalogo/ModelA/red.jpg", "Catalogo/ModelB/green.jpg"]);
    }

    #[test]
    fn test_scan_files_missing() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("a.jpg");
        File::create(&present).unwrap();

        let (files, missing) = scan_files(&[PathBuf::from("/nonexistent/a.jpg"), present]);
        assert_eq!(files.len(), 1);
        assert_eq!(missing.len(), 1);
        assert!(matches!(missing[0], CatalogError::FileNotFound(_)));
    }
}
