//! fabric-catalog
//!
//! 生地・家具ショールーム用のカタログ取込とビジュアライザ。
//! フォルダ一括取込 → 画像正規化 → 下書き確認 → リトライ付きの一括保存、
//! ローカル退避キャッシュからの復旧、AIによる張り替え合成を提供する。

pub mod access;
pub mod ai;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod imaging;
pub mod ingest;
pub mod interrupt;
pub mod scanner;
pub mod store;
pub mod visualizer;
