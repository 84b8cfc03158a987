//! Shared types, error model, and configuration for answerlab.
//!
//! This crate is the foundation depended on by all other answerlab crates.
//! It provides:
//! - [`AnswerLabError`] — the unified error type
//! - Workbook data model ([`Workbook`], [`Sheet`], [`Cell`], [`RunId`])
//! - Configuration ([`AppConfig`], [`ExtractConfig`], [`AnalysisConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalysisConfig, AppConfig, ExtractConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from, validate_analysis_config,
    validate_extract_config,
};
pub use error::{AnswerLabError, Result};
pub use types::{
    Cell, ITERATION_COLUMN, MAX_SHEET_NAME_LEN, RunId, Sheet, Workbook, WorkbookMeta,
};
