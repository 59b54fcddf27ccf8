//! 一括取込
//!
//! フォルダ取込: スキャン → フォルダ単位でグループ化 → 画像を1枚ずつ正規化 → 下書き
//! ファイル一覧取込: 画像1枚ごとに1件の下書き（上限件数あり）
//!
//! 処理は1ファイルずつ順番に行う。個々のファイルの失敗は警告として集め、
//! 取込全体は止めない。

pub mod drafts;

use crate::error::{CatalogError, Result};
use crate::imaging::{encode_document, normalize_file_async, ImageBudget};
use crate::scanner::{self, FileKind, FolderGroup, SourceFile};
use fabric_catalog_common::{to_display_name, BulkDraft, ColorVariant};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// カラーバリエーション・代表画像
    pub thumbnail: ImageBudget,
    /// 仕様書画像
    pub sheet: ImageBudget,
    pub pdf_warn_bytes: u64,
    /// ファイル一覧取込の上限
    pub file_cap: usize,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub drafts: Vec<BulkDraft>,
    /// ファイル単位の失敗・スキップ
    pub warnings: Vec<String>,
    /// 中断された場合true（それまでの下書きは有効）
    pub cancelled: bool,
}

async fn normalize_or_warn(file: &SourceFile, budget: ImageBudget, warnings: &mut Vec<String>) -> Option<String> {
    match normalize_file_async(&file.path, budget).await {
        Ok(image) => Some(image.data_url),
        Err(e) => {
            tracing::warn!(file = %file.path.display(), error = %e, "Image skipped");
            warnings.push(e.to_string());
            None
        }
    }
}

/// PDFを読み込み、しきい値を超えていれば確認する
///
/// `confirm` にはファイル名とバイト数が渡される
pub fn load_document(path: &Path, warn_bytes: u64, confirm: &mut impl FnMut(&str, u64) -> bool) -> Result<String> {
    let document = encode_document(path, warn_bytes)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if document.oversized && !confirm(&file_name, document.size_bytes) {
        return Err(CatalogError::DocumentRejected(format!(
            "{} ({:.1} MB)",
            file_name,
            document.size_bytes as f64 / 1_000_000.0
        )));
    }
    Ok(document.data_url)
}

async fn draft_from_group(
    group: &FolderGroup,
    options: &IngestOptions,
    confirm: &mut impl FnMut(&str, u64) -> bool,
    warnings: &mut Vec<String>,
) -> Option<BulkDraft> {
    let mut draft = BulkDraft {
        name: group.name.clone(),
        source: group.folder.clone(),
        ..Default::default()
    };

    for candidate in &group.variants {
        if let Some(image) = normalize_or_warn(&candidate.file, options.thumbnail, warnings).await {
            draft.add_variant(ColorVariant::new(candidate.name.clone(), image));
        }
    }

    // 表示できる画像が1枚もなければ下書きにしない
    if draft.variants.is_empty() {
        warnings.push(format!("{}: 読み込める画像がないためスキップしました", group.folder));
        return None;
    }

    if let Some(spec_image) = &group.spec_image {
        if let Some(image) = normalize_or_warn(spec_image, options.sheet, warnings).await {
            draft.spec_image = image;
        }
    }

    if let Some(document) = &group.spec_document {
        match load_document(&document.path, options.pdf_warn_bytes, confirm) {
            Ok(data_url) => draft.spec_document = data_url,
            Err(e) => {
                tracing::warn!(file = %document.path.display(), error = %e, "Spec document skipped");
                warnings.push(e.to_string());
            }
        }
    }

    Some(draft)
}

/// フォルダを取り込む
pub async fn ingest_folder(
    root: &Path,
    options: &IngestOptions,
    cancel: &CancellationToken,
    mut confirm: impl FnMut(&str, u64) -> bool,
    on_progress: impl Fn(usize, usize),
) -> Result<IngestReport> {
    let files = scanner::scan_tree(root)?;
    let groups = scanner::group_by_folder(&files);
    tracing::info!(root = %root.display(), files = files.len(), groups = groups.len(), "Folder grouped");

    let mut report = IngestReport::default();
    for (index, group) in groups.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if let Some(draft) = draft_from_group(group, options, &mut confirm, &mut report.warnings).await {
            report.drafts.push(draft);
        }
        on_progress(index + 1, groups.len());
    }

    Ok(report)
}

/// ファイル一覧を取り込む（画像1枚 = 下書き1件）
pub async fn ingest_files(
    paths: &[PathBuf],
    options: &IngestOptions,
    cancel: &CancellationToken,
    on_progress: impl Fn(usize, usize),
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    let cap = options.file_cap.max(1);
    let (accepted, rejected) = paths.split_at(paths.len().min(cap));
    if !rejected.is_empty() {
        report.warnings.push(format!(
            "1回に取り込めるのは{}ファイルまでです。{}ファイルをスキップしました",
            cap,
            rejected.len()
        ));
    }

    let (files, missing) = scanner::scan_files(accepted);
    report.warnings.extend(missing.iter().map(|e| e.to_string()));
    for (index, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        if file.kind != FileKind::Image {
            report.warnings.push(format!("{}: 画像ではないためスキップしました", file.file_name));
        } else if let Some(image) = normalize_or_warn(file, options.thumbnail, &mut report.warnings).await {
            report.drafts.push(BulkDraft {
                name: to_display_name(&file.file_name),
                main_image: image,
                source: file.path.display().to_string(),
                ..Default::default()
            });
        }
        on_progress(index + 1, files.len());
    }

    Ok(report)
}
