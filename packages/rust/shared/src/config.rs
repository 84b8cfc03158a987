//! Application configuration for answerlab.
//!
//! User config lives at `~/.answerlab/answerlab.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnswerLabError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "answerlab.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".answerlab";

// ---------------------------------------------------------------------------
// Config structs (matching answerlab.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Answer extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Similarity analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Raw workbook produced by the experiment runner.
    #[serde(default)]
    pub input_file: String,

    /// File name of the cleaned workbook. The variant suffix is added to it.
    #[serde(default)]
    pub output_file: String,

    /// Directory the cleaned workbook is written to.
    #[serde(default = "default_extract_output_dir")]
    pub output_dir: String,

    /// Only these sheets are processed. Empty means every sheet.
    #[serde(default)]
    pub sheets_to_process: Vec<String>,

    /// Extraction variant: "stable", "maths", or "integral".
    #[serde(default = "default_variant")]
    pub variant: String,

    /// Rows above the header in spreadsheet input (the runner writes a
    /// one-row run description first). Ignored for JSON workbooks.
    #[serde(default = "default_title_rows")]
    pub title_rows: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_file: String::new(),
            output_file: String::new(),
            output_dir: default_extract_output_dir(),
            sheets_to_process: Vec::new(),
            variant: default_variant(),
            title_rows: default_title_rows(),
        }
    }
}

fn default_extract_output_dir() -> String {
    "intermediate".into()
}
fn default_variant() -> String {
    "stable".into()
}
fn default_title_rows() -> u32 {
    1
}

/// `[analysis]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Cleaned workbook produced by the extraction step.
    #[serde(default)]
    pub input_file: String,

    /// File name of the scored workbook.
    #[serde(default)]
    pub output_file: String,

    /// Directory the scored workbook is written to.
    #[serde(default = "default_analysis_output_dir")]
    pub output_dir: String,

    /// Every accepted answer. Each cell keeps its best score across the list.
    #[serde(default)]
    pub correct_answers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_file: String::new(),
            output_file: String::new(),
            output_dir: default_analysis_output_dir(),
            correct_answers: Vec::new(),
        }
    }
}

fn default_analysis_output_dir() -> String {
    "results".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.answerlab/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AnswerLabError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.answerlab/answerlab.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AnswerLabError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        AnswerLabError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AnswerLabError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AnswerLabError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| AnswerLabError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Check that the `[extract]` section names both an input and an output file.
pub fn validate_extract_config(config: &ExtractConfig) -> Result<()> {
    if config.input_file.trim().is_empty() || config.output_file.trim().is_empty() {
        return Err(AnswerLabError::config(
            "'input_file' and 'output_file' must be set in the [extract] section",
        ));
    }
    Ok(())
}

/// Check that the `[analysis]` section is complete, including at least one
/// reference answer.
pub fn validate_analysis_config(config: &AnalysisConfig) -> Result<()> {
    if config.input_file.trim().is_empty() || config.output_file.trim().is_empty() {
        return Err(AnswerLabError::config(
            "'input_file' and 'output_file' must be set in the [analysis] section",
        ));
    }
    if config.correct_answers.is_empty() {
        return Err(AnswerLabError::config(
            "'correct_answers' must be a non-empty list in the [analysis] section",
        ));
    }
    Ok(())
}
