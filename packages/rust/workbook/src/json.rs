//! JSON workbooks.

use std::path::Path;

use answerlab_shared::{AnswerLabError, Result, Workbook};

pub(crate) async fn read(path: &Path) -> Result<Workbook> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnswerLabError::io(path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| AnswerLabError::parse(format!("failed to parse {}: {e}", path.display())))
}

pub(crate) async fn write(path: &Path, workbook: &Workbook) -> Result<()> {
    let content = serde_json::to_string_pretty(workbook)
        .map_err(|e| AnswerLabError::parse(format!("failed to encode workbook: {e}")))?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| AnswerLabError::io(path, e))
}
