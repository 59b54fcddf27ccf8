//! Fabric Catalog Common Library
//!
//! CLIとライブラリで共有される型とユーティリティ（I/Oなし）

pub mod types;
pub mod canonical;
pub mod naming;
pub mod data_url;
pub mod error;
pub mod gate;
pub mod parser;
pub mod prompts;

pub use types::{
    BulkDraft, CatalogItem, Category, ColorVariant, ExtractedDetails, FurnitureTemplate, Specs,
};
pub use canonical::{canonicalize_item, canonicalize_template, Record};
pub use naming::{folder_display_name, is_hidden, is_spec_artifact, to_display_name};
pub use data_url::{
    extract_base64_from_data_url, extract_mime_type_from_data_url, is_data_url, to_data_url,
};
pub use error::{Error, Result};
pub use gate::{AccessGate, GateOutcome};
pub use parser::{extract_json, parse_extraction_response};
pub use prompts::{build_composition_prompt, build_extraction_prompt, build_template_prompt};
