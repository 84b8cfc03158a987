//! Error types for answerlab.
//!
//! Library crates use [`AnswerLabError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all answerlab operations.
///
/// Per-cell extraction never produces one of these; only configuration and
/// workbook I/O can fail.
#[derive(Debug, thiserror::Error)]
pub enum AnswerLabError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Workbook file could not be decoded or encoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Structural problem inside a workbook (missing sheet, ragged rows, ...).
    #[error("workbook error: {0}")]
    Workbook(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad variant name, empty reference list, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AnswerLabError>;

impl AnswerLabError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AnswerLabError::config("input_file is not set");
        assert_eq!(err.to_string(), "config error: input_file is not set");

        let err = AnswerLabError::validation("unknown variant 'fancy'");
        assert!(err.to_string().contains("unknown variant"));

        let err = AnswerLabError::Workbook("sheet 'Run 1' has 3 columns".into());
        assert!(err.to_string().starts_with("workbook error:"));
    }

    #[test]
    fn io_error_mentions_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = AnswerLabError::io("/tmp/missing.json", source);
        let msg = err.to_string();
        assert!(msg.contains("missing.json"));
        assert!(msg.contains("gone"));
    }
}
