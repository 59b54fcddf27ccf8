use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Password};
use fabric_catalog::access::{self, HttpNotifier, Notifier};
use fabric_catalog::ai::{GeminiClient, ImageAi};
use fabric_catalog::cache::{LocalCache, RescueOutcome};
use fabric_catalog::catalog::Catalog;
use fabric_catalog::cli::{Cli, Commands, DraftAction, FurnitureAction};
use fabric_catalog::config::Config;
use fabric_catalog::error::CatalogError;
use fabric_catalog::imaging::{self, ImagePreset, RemoteResolver};
use fabric_catalog::ingest::drafts::{self, DraftFile, DraftUpdate};
use fabric_catalog::ingest::{self, IngestOptions, IngestReport};
use fabric_catalog::interrupt::Interrupt;
use fabric_catalog::scanner::{self, FileKind};
use fabric_catalog::store::{new_record_id, CatalogRepository, DocumentStore, MemoryStore, RestStore};
use fabric_catalog::visualizer::{self, Visualizer};
use fabric_catalog_common::{
    build_template_prompt, is_data_url, BulkDraft, CatalogItem, ColorVariant, FurnitureTemplate, Record,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn init_tracing(verbose: bool) {
    let default = if verbose { "fabric_catalog=debug" } else { "fabric_catalog=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}") {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(message.to_string());
    pb
}

fn confirm(prompt: &str, default: bool) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .unwrap_or(false)
}

fn read_code(prompt: &str) -> Option<String> {
    Password::new().with_prompt(prompt).interact().ok()
}

async fn require_code(gate: &str, prompt: &str, code: &str, config: &Config) -> fabric_catalog::error::Result<()> {
    let notifier = config.notify_url.as_deref().map(HttpNotifier::new);
    access::unlock(
        gate,
        code,
        || read_code(prompt),
        notifier.as_ref().map(|n| n as &dyn Notifier),
    )
    .await
}

fn open_catalog(config: &Config, dry_run: bool, cancel: &CancellationToken) -> fabric_catalog::error::Result<Catalog> {
    let (store, cache_path): (Arc<dyn DocumentStore>, _) = if dry_run {
        println!("（ドライラン: ストアには書き込みません）");
        (
            Arc::new(MemoryStore::new()),
            std::env::temp_dir().join("fabric-catalog-dry-run.json"),
        )
    } else {
        let store = RestStore::new(&config.get_store_url()?, config.get_store_token(), config.timeout())?;
        (Arc::new(store), config.cache_path()?)
    };

    let repo = CatalogRepository::new(store, config.batch, cancel.clone());
    Ok(Catalog::new(repo, LocalCache::load(&cache_path)))
}

fn ingest_options(config: &Config) -> IngestOptions {
    IngestOptions {
        thumbnail: config.budget(ImagePreset::Thumbnail),
        sheet: config.budget(ImagePreset::Sheet),
        pdf_warn_bytes: config.pdf_warn_bytes,
        file_cap: config.bulk_file_cap,
    }
}

fn resolver(config: &Config) -> fabric_catalog::error::Result<RemoteResolver> {
    RemoteResolver::with_defaults(config.timeout(), config.cors_relay_url.as_deref())
}

fn gemini(config: &Config) -> fabric_catalog::error::Result<GeminiClient> {
    GeminiClient::new(
        config.get_api_key()?,
        config.model.clone(),
        config.image_model.clone(),
        config.timeout(),
    )
}

fn confirm_large_pdf(yes: bool) -> impl FnMut(&str, u64) -> bool {
    move |name: &str, size: u64| {
        yes || confirm(
            &format!("{} は {:.1}MB あります。このまま取り込みますか？", name, size as f64 / 1_000_000.0),
            false,
        )
    }
}

fn print_draft_line(draft: &BulkDraft) {
    println!(
        "  [{}] {} ({}色){}{}",
        draft.temp_id,
        if draft.name.is_empty() { "(名前なし)" } else { draft.name.as_str() },
        draft.variants.len(),
        if draft.spec_document.is_empty() { "" } else { " 📄" },
        if draft.spec_image.is_empty() { "" } else { " 🖼" },
    );
}

fn print_draft_detail(draft: &BulkDraft) {
    println!("下書き [{}]", draft.temp_id);
    println!("  名前: {}", draft.name);
    println!("  仕入先: {}", draft.supplier);
    println!("  カタログ: {}", draft.catalog);
    println!("  種類: {}", draft.category);
    if !draft.summary.is_empty() {
        println!("  概要: {}", draft.summary);
    }
    println!("  取込元: {}", draft.source);
    println!("  カラー:");
    for variant in &draft.variants {
        let main = if !variant.image.is_empty() && variant.image == draft.main_image { " (メイン)" } else { "" };
        println!("    - {}{}", variant.name, main);
    }
    println!("  仕様書PDF: {}", if draft.spec_document.is_empty() { "なし" } else { "あり" });
    println!("  仕様書画像: {}", if draft.spec_image.is_empty() { "なし" } else { "あり" });
}

fn report_ingest(report: IngestReport, drafts_path: &Path) -> anyhow::Result<()> {
    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }

    let mut draft_file = DraftFile::load(drafts_path);
    let added = report.drafts.len();
    let ids = draft_file.append(report.drafts);
    draft_file.save()?;

    for id in &ids {
        if let Ok(draft) = draft_file.get(id) {
            print_draft_line(draft);
        }
    }
    if report.cancelled {
        println!("\n中断しました（{}件の下書きを保存）", added);
    } else {
        println!("\n✔ {}件の下書きを作成しました", added);
    }
    println!("  `fabric-catalog draft show` で確認、`fabric-catalog commit` で確定します");
    Ok(())
}

/// リモートが空でキャッシュに復旧対象があれば、復旧を提案
async fn offer_rescue(catalog: &Catalog, remote_count: usize, yes: bool) -> anyhow::Result<()> {
    let pb = progress_bar("復旧中");
    let outcome = catalog
        .rescue(
            remote_count,
            |available| {
                yes || confirm(
                    &format!(
                        "リモートのカタログが空です。ローカルに{}件のデータがあります。アップロードしますか？",
                        available
                    ),
                    true,
                )
            },
            |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            },
        )
        .await;
    pb.finish_and_clear();

    match outcome? {
        RescueOutcome::NotNeeded => {}
        RescueOutcome::Declined { available } => {
            println!("復旧をスキップしました（ローカルに{}件あります）", available);
        }
        RescueOutcome::Restored(report) => {
            println!("✔ {}件をリモートに復旧しました", report.committed);
        }
    }
    Ok(())
}

/// 画像参照をサムネイルのData URLにする
async fn variant_image(resolver: &RemoteResolver, config: &Config, reference: &str) -> anyhow::Result<String> {
    let resolved = resolver.resolve(reference, config.budget(ImagePreset::Thumbnail)).await?;
    Ok(resolved.data_url())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    let interrupt = Interrupt::new();
    interrupt.listen();
    let cancel = interrupt.token();

    if let Some(code) = config.get_launch_code() {
        require_code("launch", "起動コード", &code, &config).await?;
    }
    if cli.command.writes_catalog() {
        if let Some(code) = config.get_upload_code() {
            require_code("upload", "アップロードコード", &code, &config).await?;
        }
    }

    let dry_run = cli.dry_run;
    match cli.command {
        Commands::Ingest { folder, yes } => {
            println!("📁 fabric-catalog - フォルダ取込\n");
            let _scope = interrupt.cancellable();

            let pb = progress_bar("正規化中");
            let mut confirm_pdf = confirm_large_pdf(yes);
            let report = ingest::ingest_folder(
                &folder,
                &ingest_options(&config),
                &cancel,
                |name: &str, size: u64| pb.suspend(|| confirm_pdf(name, size)),
                |done, total| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                },
            )
            .await?;
            pb.finish_and_clear();

            report_ingest(report, &config.drafts_path()?)?;
        }

        Commands::Upload { files } => {
            println!("🖼 fabric-catalog - 画像取込\n");
            let _scope = interrupt.cancellable();

            let pb = progress_bar("正規化中");
            let report = ingest::ingest_files(&files, &ingest_options(&config), &cancel, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            })
            .await?;
            pb.finish_and_clear();

            report_ingest(report, &config.drafts_path()?)?;
        }

        Commands::Add {
            name,
            supplier,
            catalog,
            category,
            summary,
            variants,
            spec_document,
            spec_image,
            yes,
        } => {
            println!("➕ fabric-catalog - 登録\n");
            let resolver = resolver(&config)?;

            let mut item = CatalogItem {
                id: new_record_id(&name),
                name: name.trim().to_string(),
                supplier,
                catalog,
                category,
                summary,
                ..Default::default()
            };

            for (variant_name, reference) in &variants {
                let image = variant_image(&resolver, &config, reference).await?;
                if item.main_image.is_empty() {
                    item.main_image = image.clone();
                }
                item.variants.push(ColorVariant::new(variant_name.clone(), image));
            }
            if !item.has_main_image() {
                return Err(CatalogError::MissingMainImage(item.name).into());
            }

            if let Some(path) = spec_document {
                item.spec_document = ingest::load_document(&path, config.pdf_warn_bytes, &mut confirm_large_pdf(yes))?;
            }
            if let Some(path) = spec_image {
                item.spec_image = imaging::normalize_file(&path, config.budget(ImagePreset::Sheet))?.data_url;
            }

            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            catalog.save_item(&item).await?;
            println!("✔ 登録しました: {} ({})", item.name, item.id);
        }

        Commands::Draft { action } => {
            let drafts_path = config.drafts_path()?;
            let mut draft_file = DraftFile::load(&drafts_path);

            match action {
                DraftAction::Show { id: None } => {
                    if draft_file.is_empty() {
                        println!("下書きはありません");
                    } else {
                        println!("下書き: {}件", draft_file.len());
                        for draft in draft_file.drafts() {
                            print_draft_line(draft);
                        }
                    }
                }
                DraftAction::Show { id: Some(id) } => {
                    print_draft_detail(draft_file.get(&id)?);
                }
                DraftAction::Set {
                    id,
                    name,
                    supplier,
                    catalog,
                    category,
                    summary,
                } => {
                    let update = DraftUpdate {
                        name,
                        supplier,
                        catalog,
                        category,
                        summary,
                    };
                    if update.is_empty() {
                        println!("変更する項目を指定してください（--name, --supplier, --catalog, --category, --summary）");
                        return Ok(());
                    }
                    draft_file.update(&id, &update)?;
                    draft_file.save()?;
                    println!("✔ 下書き[{}]を更新しました", id);
                }
                DraftAction::RenameVariant { id, old, new } => {
                    draft_file.rename_variant(&id, &old, &new)?;
                    draft_file.save()?;
                    println!("✔ {} → {}", old, new);
                }
                DraftAction::RemoveVariant { id, name } => {
                    draft_file.remove_variant(&id, &name)?;
                    draft_file.save()?;
                    println!("✔ {} を削除しました", name);
                    if draft_file.get(&id)?.main_image.is_empty() {
                        println!("⚠ メイン画像がありません。確定前にバリエーションを追加してください");
                    }
                }
                DraftAction::AddVariant { id, name, image } => {
                    draft_file.get(&id)?;
                    let resolver = resolver(&config)?;
                    let image = variant_image(&resolver, &config, &image).await?;
                    draft_file.add_variant(&id, ColorVariant::new(name.trim(), image))?;
                    draft_file.save()?;
                    println!("✔ {} を追加しました", name.trim());
                }
                DraftAction::AttachSpec { id, file, yes } => {
                    draft_file.get(&id)?;
                    match scanner::detect_kind(&file) {
                        FileKind::Pdf => {
                            let document =
                                ingest::load_document(&file, config.pdf_warn_bytes, &mut confirm_large_pdf(yes))?;
                            draft_file.get_mut(&id)?.spec_document = document;
                        }
                        FileKind::Image => {
                            let image = imaging::normalize_file(&file, config.budget(ImagePreset::Sheet))?;
                            draft_file.get_mut(&id)?.spec_image = image.data_url;
                        }
                        FileKind::Other => {
                            return Err(
                                CatalogError::image(file.display().to_string(), "PDFまたは画像を指定してください").into()
                            );
                        }
                    }
                    draft_file.save()?;
                    println!("✔ 仕様書を添付しました");
                }
                DraftAction::Extract { id } => {
                    let draft = draft_file.get(&id)?;
                    let source = if !draft.spec_document.is_empty() {
                        draft.spec_document.clone()
                    } else if !draft.spec_image.is_empty() {
                        draft.spec_image.clone()
                    } else {
                        println!("仕様書が添付されていません（`draft attach-spec` で添付してください）");
                        return Ok(());
                    };

                    println!("🤖 仕様書を読み取り中...");
                    let document = resolver(&config)?
                        .resolve(&source, config.budget(ImagePreset::Sheet))
                        .await?;
                    let details = gemini(&config)?.extract_details(&document).await?;

                    drafts::apply_extracted(draft_file.get_mut(&id)?, &details);
                    draft_file.save()?;
                    print_draft_detail(draft_file.get(&id)?);
                }
                DraftAction::Discard { id, all } => {
                    if all {
                        let count = draft_file.discard_all();
                        draft_file.save()?;
                        println!("✔ {}件の下書きを破棄しました", count);
                    } else if let Some(id) = id {
                        let draft = draft_file.discard(&id)?;
                        draft_file.save()?;
                        println!("✔ 下書き[{}] {} を破棄しました", id, draft.name);
                    } else {
                        println!("破棄する下書きIDか --all を指定してください");
                    }
                }
            }
        }

        Commands::Commit { ids, allow_duplicates } => {
            println!("💾 fabric-catalog - 確定\n");

            let drafts_path = config.drafts_path()?;
            let mut draft_file = DraftFile::load(&drafts_path);
            if draft_file.assign_item_ids() > 0 {
                draft_file.save()?;
            }
            let selected: Vec<BulkDraft> = if ids.is_empty() {
                draft_file.drafts().to_vec()
            } else {
                ids.iter()
                    .map(|id| draft_file.get(id).cloned())
                    .collect::<fabric_catalog::error::Result<_>>()?
            };
            if selected.is_empty() {
                println!("確定する下書きがありません");
                return Ok(());
            }

            let items = drafts::drafts_to_items(&selected)?;
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;

            println!("[1/2] 既存のカタログを確認中...");
            let existing = catalog.load_items().await?;
            let duplicates = drafts::find_duplicates(&selected, &existing);
            if !duplicates.is_empty() {
                for draft in &duplicates {
                    println!("⚠ 同じ名前のエントリがあります: [{}] {}", draft.temp_id, draft.name);
                }
                if !allow_duplicates && !confirm("このまま保存しますか？", false) {
                    println!("中止しました");
                    return Ok(());
                }
            }

            println!("[2/2] {}件を保存中...", items.len());
            let _scope = interrupt.cancellable();
            let pb = progress_bar("保存中");
            let result = catalog
                .commit_items(&items, |done, total| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                })
                .await;
            pb.finish_and_clear();

            // 保存できた分（先頭から順）は下書きから外す
            let committed = match &result {
                Ok(report) => report.committed,
                Err(CatalogError::PartialCommit { committed, .. }) | Err(CatalogError::Cancelled { committed, .. }) => {
                    *committed
                }
                Err(_) => 0,
            };
            let done_ids: Vec<String> = selected.iter().take(committed).map(|d| d.temp_id.clone()).collect();
            draft_file.remove_committed(&done_ids);
            draft_file.save()?;

            let report = result?;
            println!("\n✅ {}件を保存しました", report.committed);
        }

        Commands::List { json } => {
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            let items = catalog.load_items().await?;

            if items.is_empty() {
                println!("カタログは空です");
                let _scope = interrupt.cancellable();
                offer_rescue(&catalog, 0, false).await?;
                return Ok(());
            }

            if json {
                let documents: Vec<_> = items.iter().map(|item| item.to_document()).collect();
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                println!("カタログ: {}件", items.len());
                for item in &items {
                    let colors: Vec<&str> = item.color_names().collect();
                    println!(
                        "  {} | {} | {} | {} | {}",
                        item.id,
                        item.name,
                        item.category,
                        item.supplier,
                        colors.join(", ")
                    );
                }
            }
        }

        Commands::Delete { id } => {
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            catalog.delete_item(&id).await?;
            println!("✔ 削除しました: {}", id);
        }

        Commands::Clear { yes } => {
            if !yes && !confirm("カタログをすべて削除します。よろしいですか？", false) {
                println!("中止しました");
                return Ok(());
            }
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            let _scope = interrupt.cancellable();
            let deleted = catalog.clear_items().await?;
            println!("✔ {}件を削除しました", deleted);
        }

        Commands::Rescue { yes } => {
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            let remote_count = catalog.load_items().await?.len();
            if remote_count > 0 {
                println!("リモートに{}件あるため、復旧は不要です", remote_count);
                return Ok(());
            }
            if catalog.cache().embedded_entries().is_empty() {
                println!("ローカルに復旧できるデータはありません");
                return Ok(());
            }
            let _scope = interrupt.cancellable();
            offer_rescue(&catalog, remote_count, yes).await?;
        }

        Commands::Extract { file } => {
            println!("🤖 仕様書を読み取り中...");
            let document = match scanner::detect_kind(&file) {
                FileKind::Pdf => ingest::load_document(&file, u64::MAX, &mut |_: &str, _: u64| true)?,
                FileKind::Image => imaging::normalize_file(&file, config.budget(ImagePreset::Sheet))?.data_url,
                FileKind::Other => {
                    return Err(CatalogError::image(file.display().to_string(), "PDFまたは画像を指定してください").into())
                }
            };
            let document = resolver(&config)?
                .resolve(&document, config.budget(ImagePreset::Sheet))
                .await?;
            let details = gemini(&config)?.extract_details(&document).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }

        Commands::Visualize {
            furniture,
            fabric,
            variant,
            output,
        } => {
            println!("🛋 fabric-catalog - 張り替えビジュアライザ\n");
            let mut catalog = open_catalog(&config, dry_run, &cancel)?;
            let items = catalog.load_items().await?;
            let fabric = items
                .iter()
                .find(|i| i.id == fabric)
                .ok_or_else(|| CatalogError::RecordNotFound(fabric.clone()))?;

            let templates = catalog.load_templates().await?;
            let furniture = visualizer::select_furniture(&furniture, &templates)?;

            let ai = gemini(&config)?;
            let resolver = resolver(&config)?;
            let image = Visualizer::new(&ai, &resolver, config.budget(ImagePreset::Hero))
                .render(&furniture, fabric, variant.as_deref())
                .await?;

            visualizer::write_jpeg(&image, &output)?;
            println!("✔ 保存しました: {}", output.display());
        }

        Commands::Synthesize {
            description,
            category,
            aspect,
            resolution,
            output,
            save_as,
        } => {
            println!("🎨 家具画像を生成中...");
            let prompt = build_template_prompt(&description, &category);
            let image = gemini(&config)?.synthesize_image(&prompt, aspect, resolution).await?;
            visualizer::write_jpeg(&image, &output)?;
            println!("✔ 保存しました: {}", output.display());

            if let Some(name) = save_as {
                let normalized = imaging::normalize_file(&output, config.budget(ImagePreset::Hero))?;
                let template = FurnitureTemplate {
                    id: new_record_id(&name),
                    name,
                    category,
                    image: normalized.data_url,
                    ..Default::default()
                };
                open_catalog(&config, dry_run, &cancel)?.save_template(&template).await?;
                println!("✔ 家具テンプレートとして保存しました: {}", template.id);
            }
        }

        Commands::Furniture { action } => {
            let catalog = open_catalog(&config, dry_run, &cancel)?;
            match action {
                FurnitureAction::Add {
                    name,
                    image,
                    category,
                    supplier,
                    collection,
                } => {
                    let image = if is_data_url(&image) {
                        image
                    } else {
                        resolver(&config)?
                            .resolve(&image, config.budget(ImagePreset::Hero))
                            .await?
                            .data_url()
                    };
                    let template = FurnitureTemplate {
                        id: new_record_id(&name),
                        name,
                        category,
                        supplier,
                        image,
                        collection,
                        ephemeral: false,
                    };
                    catalog.save_template(&template).await?;
                    println!("✔ 登録しました: {} ({})", template.name, template.id);
                }
                FurnitureAction::List => {
                    let templates = catalog.load_templates().await?;
                    println!("家具テンプレート: {}件", templates.len());
                    for t in &templates {
                        println!("  {} | {} | {} | {}", t.id, t.name, t.category, t.supplier);
                    }
                }
                FurnitureAction::Delete { id } => {
                    catalog.delete_template(&id).await?;
                    println!("✔ 削除しました: {}", id);
                }
            }
        }

        Commands::Config {
            set_api_key,
            set_store_url,
            set_store_token,
            set_relay_url,
            set_notify_url,
            set_launch_code,
            set_upload_code,
            show,
        } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }
            if let Some(url) = set_store_url {
                config.set_store_url(url)?;
                println!("✔ ストアURLを設定しました");
            }
            if let Some(token) = set_store_token {
                config.set_store_token(token)?;
                println!("✔ ストアのトークンを設定しました");
            }
            if let Some(url) = set_relay_url {
                config.set_relay_url(url)?;
                println!("✔ リレーURLを設定しました");
            }
            if let Some(url) = set_notify_url {
                config.set_notify_url(url)?;
                println!("✔ 通知先URLを設定しました");
            }
            if let Some(code) = set_launch_code {
                config.set_launch_code(code)?;
                println!("✔ 起動コードを設定しました");
            }
            if let Some(code) = set_upload_code {
                config.set_upload_code(code)?;
                println!("✔ アップロードコードを設定しました");
            }

            if show {
                let set = |present: bool| if present { "設定済み" } else { "未設定" };
                println!("設定: {}", Config::config_path()?.display());
                println!("  ストアURL: {}", config.get_store_url().unwrap_or_else(|_| "未設定".into()));
                println!("  ストアトークン: {}", set(config.get_store_token().is_some()));
                println!("  APIキー: {}", set(config.get_api_key().is_ok()));
                println!("  モデル: {} / 画像: {}", config.model, config.image_model);
                println!("  リレーURL: {}", config.cors_relay_url.as_deref().unwrap_or("未設定"));
                println!("  起動コード: {}", set(config.get_launch_code().is_some()));
                println!("  アップロードコード: {}", set(config.get_upload_code().is_some()));
                println!(
                    "  一括保存: {}件ずつ, 間隔{}ms, リトライ{}回",
                    config.batch.chunk_size, config.batch.chunk_pause_ms, config.batch.retry.max_retries
                );
                println!(
                    "  画像: サムネイル{}px / 仕様書{}px / 家具{}px",
                    config.presets.thumbnail.max_dimension,
                    config.presets.sheet.max_dimension,
                    config.presets.hero.max_dimension
                );
                println!("  PDF確認しきい値: {} bytes", config.pdf_warn_bytes);
            }
        }

        Commands::Cache { clear, info } => {
            let cache_path = config.cache_path()?;

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if cache_path.exists() {
                    let cache = LocalCache::load(&cache_path);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    println!("  復旧対象（埋め込み画像あり）: {}", cache.embedded_entries().len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match LocalCache::clear(&cache_path).context("キャッシュ削除エラー")? {
                    true => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    false => println!("キャッシュファイルが存在しません"),
                }
            }
        }
    }

    Ok(())
}
