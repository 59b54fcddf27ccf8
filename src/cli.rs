use crate::ai::{AspectRatio, Resolution};
use clap::{Parser, Subcommand};
use fabric_catalog_common::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fabric-catalog")]
#[command(about = "生地・家具ショールーム用カタログ取込・ビジュアライザ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// リモートストアを使わずメモリ上で実行（動作確認用）
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フォルダを取り込んで下書きを作成（サブフォルダ1つ = 1エントリ）
    Ingest {
        /// 取込フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 大きなPDFも確認せずに取り込む
        #[arg(short, long)]
        yes: bool,
    },

    /// 画像ファイルを個別に取り込んで下書きを作成（1ファイル = 1エントリ）
    Upload {
        /// 画像ファイル
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// 1件を直接登録
    Add {
        /// 名前
        #[arg(required = true)]
        name: String,

        #[arg(long, default_value = "")]
        supplier: String,

        #[arg(long, default_value = "")]
        catalog: String,

        /// 種類 (model/rug/wood)
        #[arg(long, default_value = "model")]
        category: Category,

        #[arg(long, default_value = "")]
        summary: String,

        /// カラーバリエーション（NAME=画像パスまたはURL、複数指定可）
        #[arg(long = "variant", value_parser = parse_variant_arg)]
        variants: Vec<(String, String)>,

        /// 仕様書PDF
        #[arg(long)]
        spec_document: Option<PathBuf>,

        /// 仕様書画像
        #[arg(long)]
        spec_image: Option<PathBuf>,

        /// 大きなPDFも確認せずに取り込む
        #[arg(short, long)]
        yes: bool,
    },

    /// 下書きの確認・編集
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// 下書きを確定してストアに保存
    Commit {
        /// 対象の下書きID（省略時はすべて）
        ids: Vec<String>,

        /// 既存エントリと名前が重複していても保存する
        #[arg(long)]
        allow_duplicates: bool,
    },

    /// カタログを一覧表示
    List {
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// エントリを削除
    Delete {
        #[arg(required = true)]
        id: String,
    },

    /// カタログを全削除
    Clear {
        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },

    /// ローカルキャッシュからリモートへ復旧
    Rescue {
        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },

    /// 仕様書（PDF/画像）から情報を抽出
    Extract {
        /// 仕様書ファイル
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 家具写真の生地を張り替えた画像を生成
    Visualize {
        /// 家具（テンプレートID / 画像URL / ローカル画像パス）
        #[arg(long, required = true)]
        furniture: String,

        /// 生地エントリのID
        #[arg(long, required = true)]
        fabric: String,

        /// カラーバリエーション名（省略時はメイン画像）
        #[arg(long)]
        variant: Option<String>,

        /// 出力ファイル
        #[arg(short, long, default_value = "visualization.jpg")]
        output: PathBuf,
    },

    /// 説明文から家具テンプレート画像を生成
    Synthesize {
        /// 家具の説明
        #[arg(required = true)]
        description: String,

        /// 家具の種類（sofa, armchair など）
        #[arg(long, default_value = "sofa")]
        category: String,

        /// 縦横比 (1:1, 3:4, 4:3, 9:16, 16:9)
        #[arg(long, default_value = "4:3")]
        aspect: AspectRatio,

        /// 解像度 (1K/2K)
        #[arg(long, default_value = "1K")]
        resolution: Resolution,

        /// 出力ファイル
        #[arg(short, long, default_value = "furniture.jpg")]
        output: PathBuf,

        /// 家具テンプレートとして保存する名前
        #[arg(long)]
        save_as: Option<String>,
    },

    /// 家具テンプレート管理
    Furniture {
        #[command(subcommand)]
        action: FurnitureAction,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// ストアURLを設定
        #[arg(long)]
        set_store_url: Option<String>,

        /// ストアのトークンを設定
        #[arg(long)]
        set_store_token: Option<String>,

        /// CORSリレーURLを設定
        #[arg(long)]
        set_relay_url: Option<String>,

        /// ロック時の通知先URLを設定
        #[arg(long)]
        set_notify_url: Option<String>,

        /// 起動コード（4桁）を設定
        #[arg(long)]
        set_launch_code: Option<String>,

        /// アップロードコード（4桁）を設定
        #[arg(long)]
        set_upload_code: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// ローカルキャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

impl Commands {
    /// アップロードコードが必要なコマンド
    pub fn writes_catalog(&self) -> bool {
        match self {
            Commands::Ingest { .. }
            | Commands::Upload { .. }
            | Commands::Add { .. }
            | Commands::Commit { .. }
            | Commands::Delete { .. }
            | Commands::Clear { .. }
            | Commands::Rescue { .. } => true,
            Commands::Furniture { action } => !matches!(action, FurnitureAction::List),
            Commands::Synthesize { save_as, .. } => save_as.is_some(),
            _ => false,
        }
    }
}

#[derive(Subcommand)]
pub enum DraftAction {
    /// 下書きを表示（ID省略時は一覧）
    Show { id: Option<String> },

    /// 項目を変更
    Set {
        #[arg(required = true)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        supplier: Option<String>,

        #[arg(long)]
        catalog: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        summary: Option<String>,
    },

    /// バリエーション名を変更
    RenameVariant {
        #[arg(required = true)]
        id: String,
        #[arg(required = true)]
        old: String,
        #[arg(required = true)]
        new: String,
    },

    /// バリエーションを削除
    RemoveVariant {
        #[arg(required = true)]
        id: String,
        #[arg(required = true)]
        name: String,
    },

    /// バリエーションを追加
    AddVariant {
        #[arg(required = true)]
        id: String,
        #[arg(required = true)]
        name: String,
        /// 画像パスまたはURL
        #[arg(required = true)]
        image: String,
    },

    /// 仕様書（PDFまたは画像）を添付
    AttachSpec {
        #[arg(required = true)]
        id: String,
        #[arg(required = true)]
        file: PathBuf,
        /// 大きなPDFも確認せずに添付する
        #[arg(short, long)]
        yes: bool,
    },

    /// 添付された仕様書をAIで読み取り、項目を埋める
    Extract {
        #[arg(required = true)]
        id: String,
    },

    /// 下書きを破棄
    Discard {
        id: Option<String>,

        /// すべて破棄
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum FurnitureAction {
    /// 家具テンプレートを登録
    Add {
        #[arg(required = true)]
        name: String,

        /// 画像パスまたはURL
        #[arg(required = true)]
        image: String,

        #[arg(long, default_value = "sofa")]
        category: String,

        #[arg(long, default_value = "")]
        supplier: String,

        #[arg(long, default_value = "")]
        collection: String,
    },

    /// 家具テンプレートを一覧表示
    List,

    /// 家具テンプレートを削除
    Delete {
        #[arg(required = true)]
        id: String,
    },
}

/// `NAME=path` 形式のバリエーション指定
pub fn parse_variant_arg(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, image)) if !name.trim().is_empty() && !image.trim().is_empty() => {
            Ok((name.trim().to_string(), image.trim().to_string()))
        }
        _ => Err(format!("バリエーションは NAME=画像 の形式で指定してください: {}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant_arg() {
        assert_eq!(
            parse_variant_arg("Navy blue=./navy.jpg").unwrap(),
            ("Navy blue".to_string(), "./navy.jpg".to_string())
        );
        assert_eq!(
            parse_variant_arg("Red=https://cdn.example.com/red.jpg?v=2").unwrap().1,
            "https://cdn.example.com/red.jpg?v=2"
        );
        assert!(parse_variant_arg("=red.jpg").is_err());
        assert!(parse_variant_arg("red.jpg").is_err());
    }

    #[test]
    fn test_commit_requires_upload_code() {
        let cli = Cli::parse_from(["fabric-catalog", "commit"]);
        assert!(cli.command.writes_catalog());

        let cli = Cli::parse_from(["fabric-catalog", "list"]);
        assert!(!cli.command.writes_catalog());

        let cli = Cli::parse_from(["fabric-catalog", "furniture", "list"]);
        assert!(!cli.command.writes_catalog());
    }

    #[test]
    fn test_add_with_variants() {
        let cli = Cli::parse_from([
            "fabric-catalog",
            "add",
            "Velvet",
            "--category",
            "rug",
            "--variant",
            "Red=red.jpg",
            "--variant",
            "Blue=blue.jpg",
        ]);
        match cli.command {
            Commands::Add { variants, category, .. } => {
                assert_eq!(variants.len(), 2);
                assert_eq!(category, Category::Rug);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_synthesize_defaults() {
        let cli = Cli::parse_from(["fabric-catalog", "synthesize", "a tufted sofa", "--aspect", "16:9"]);
        match cli.command {
            Commands::Synthesize { aspect, resolution, .. } => {
                assert_eq!(aspect, AspectRatio::Wide);
                assert_eq!(resolution, Resolution::OneK);
            }
            _ => panic!("expected synthesize"),
        }
    }
}
