//! Workbook files on disk.
//!
//! Two encodings are supported, chosen by file extension:
//! - `.json`: an ordered list of sheets,
//!   `{ "sheets": [ { "name": "run_1", "columns": ["Iteration", "gpt"], "rows": [[1, "C"]] } ] }`
//! - `.xlsx` / `.xlsm`: spreadsheets as produced by the experiment runner
//!
//! Loading never rejects a sheet for its shape; callers run [`check_shape`]
//! per sheet so one bad sheet does not sink the rest.

mod json;
mod xlsx;

use std::path::Path;

use answerlab_shared::{AnswerLabError, MAX_SHEET_NAME_LEN, Result, Sheet, Workbook};
use tracing::{debug, instrument};

/// Characters spreadsheet tools reject in sheet names.
const FORBIDDEN_SHEET_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// On-disk workbook encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Json,
    Xlsx,
}

impl WorkbookFormat {
    /// Pick the encoding from the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("xlsx" | "xlsm") => Ok(Self::Xlsx),
            _ => Err(AnswerLabError::Workbook(format!(
                "unsupported workbook file '{}': expected .json or .xlsx",
                path.display()
            ))),
        }
    }
}

/// Options for reading spreadsheet workbooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rows above the header row, skipped in `.xlsx` sheets.
    pub title_rows: u32,
}

/// Load a workbook whose header is the first row.
pub async fn load_workbook(path: &Path) -> Result<Workbook> {
    load_workbook_with(path, LoadOptions::default()).await
}

/// Load a workbook from `path`.
#[instrument(skip_all, fields(path = %path.display(), title_rows = options.title_rows))]
pub async fn load_workbook_with(path: &Path, options: LoadOptions) -> Result<Workbook> {
    let workbook = match WorkbookFormat::from_path(path)? {
        WorkbookFormat::Json => json::read(path).await?,
        WorkbookFormat::Xlsx => {
            tokio::fs::metadata(path)
                .await
                .map_err(|e| AnswerLabError::io(path, e))?;
            let owned = path.to_path_buf();
            tokio::task::spawn_blocking(move || xlsx::read(&owned, options.title_rows))
                .await
                .map_err(|e| AnswerLabError::Workbook(format!("workbook reader failed: {e}")))??
        }
    };

    debug!(sheets = workbook.sheets.len(), "workbook loaded");
    Ok(workbook)
}

/// Write `workbook` to `path`, creating parent directories.
///
/// Spreadsheets get the header in the first row and no title row. They do
/// not carry [`Workbook::meta`].
#[instrument(skip_all, fields(path = %path.display(), sheets = workbook.sheets.len()))]
pub async fn save_workbook(path: &Path, workbook: &Workbook) -> Result<()> {
    let format = WorkbookFormat::from_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AnswerLabError::io(parent, e))?;
        }
    }

    match format {
        WorkbookFormat::Json => json::write(path, workbook).await?,
        WorkbookFormat::Xlsx => {
            let owned_path = path.to_path_buf();
            let owned = workbook.clone();
            tokio::task::spawn_blocking(move || xlsx::write(&owned_path, &owned))
                .await
                .map_err(|e| AnswerLabError::Workbook(format!("workbook writer failed: {e}")))??
        }
    }

    debug!("workbook written");
    Ok(())
}

/// Make `name` acceptable as a sheet name.
///
/// Forbidden characters (`: \ / ? * [ ]`) become `_` and the result is cut
/// to 31 characters. A blank name becomes `Sheet`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Reject a sheet with rows wider than its header; short rows are padded on read.
pub fn check_shape(sheet: &Sheet) -> Result<()> {
    let width = sheet.columns.len();
    if let Some((index, row)) = sheet.rows.iter().enumerate().find(|(_, r)| r.len() > width) {
        return Err(AnswerLabError::Workbook(format!(
            "sheet '{}' row {} has {} cells but only {width} columns",
            sheet.name,
            index + 1,
            row.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use answerlab_shared::Cell;
    use uuid::Uuid;

    fn temp_path(file_name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("answerlab-wb-{}", Uuid::now_v7()))
            .join(file_name)
    }

    fn sample_workbook() -> Workbook {
        let mut sheet = Sheet::new("run", vec!["Iteration".into(), "model".into()]);
        sheet.rows.push(vec![Cell::Number(1.0), Cell::from("x + C")]);
        sheet.rows.push(vec![Cell::Number(2.0), Cell::Bool(true)]);
        Workbook {
            meta: None,
            sheets: vec![sheet],
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            WorkbookFormat::from_path(Path::new("a/b.json")).unwrap(),
            WorkbookFormat::Json
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("Results.XLSX")).unwrap(),
            WorkbookFormat::Xlsx
        );
        assert!(WorkbookFormat::from_path(Path::new("notes.csv")).is_err());
        assert!(WorkbookFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn sanitize_replaces_forbidden_chars() {
        assert_eq!(sanitize_sheet_name("a:b\\c/d?e*f[g]"), "a_b_c_d_e_f_g_");
        assert_eq!(sanitize_sheet_name("plain"), "plain");
        assert_eq!(sanitize_sheet_name("  "), "Sheet");
    }

    #[test]
    fn sanitize_truncates_to_31_chars() {
        let long = "ANALYSIS_llama-3.1-70b-instruct_temp_0.7";
        let name = sanitize_sheet_name(long);
        assert_eq!(name.chars().count(), 31);
        assert_eq!(name, "ANALYSIS_llama-3.1-70b-instruct");
    }

    #[test]
    fn check_shape_reports_wide_rows() {
        let mut sheet = Sheet::new("s", vec!["Iteration".into()]);
        sheet.rows.push(vec![Cell::Number(1.0)]);
        assert!(check_shape(&sheet).is_ok());

        sheet.rows.push(vec![Cell::Number(2.0), "extra".into()]);
        let err = check_shape(&sheet).unwrap_err();
        assert!(err.to_string().contains("row 2 has 2 cells"));
    }

    #[tokio::test]
    async fn json_save_then_load() {
        let path = temp_path("roundtrip.json");
        save_workbook(&path, &sample_workbook()).await.expect("save");
        let loaded = load_workbook(&path).await.expect("load");

        assert_eq!(loaded.sheet_names(), vec!["run"]);
        assert_eq!(loaded.sheets[0].cell(0, 1).as_text(), Some("x + C"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn xlsx_save_then_load() {
        let path = temp_path("roundtrip.xlsx");
        save_workbook(&path, &sample_workbook()).await.expect("save");
        let loaded = load_workbook(&path).await.expect("load");

        assert!(loaded.meta.is_none());
        assert_eq!(loaded.sheet_names(), vec!["run"]);
        let sheet = &loaded.sheets[0];
        assert_eq!(sheet.columns, vec!["Iteration".to_string(), "model".to_string()]);
        assert_eq!(sheet.cell(0, 0), &Cell::Number(1.0));
        assert_eq!(sheet.cell(0, 1).as_text(), Some("x + C"));
        assert_eq!(sheet.cell(1, 1), &Cell::Bool(true));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn xlsx_title_rows_are_skipped() {
        let path = temp_path("titled.xlsx");
        // a run description above the real header, as the experiment runner writes it
        let mut titled = Sheet::new("temp_0.7", vec!["Model: llama, prompt: integral".into()]);
        titled.rows.push(vec![Cell::Empty, "Iteration".into(), "llama".into()]);
        titled.rows.push(vec![Cell::Empty, Cell::Number(1.0), "x + C".into()]);
        let workbook = Workbook {
            meta: None,
            sheets: vec![titled],
        };
        save_workbook(&path, &workbook).await.expect("save");

        let loaded = load_workbook_with(&path, LoadOptions { title_rows: 1 })
            .await
            .expect("load");
        let sheet = &loaded.sheets[0];
        // column A is blank below the title, so it is dropped
        assert_eq!(sheet.columns, vec!["Iteration".to_string(), "llama".to_string()]);
        assert_eq!(sheet.iteration_column(), Some(0));
        assert_eq!(sheet.cell(0, 1).as_text(), Some("x + C"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        for name in ["missing.json", "missing.xlsx"] {
            let err = load_workbook(&temp_path(name)).await.unwrap_err();
            assert!(matches!(err, AnswerLabError::Io { .. }), "{name}: {err}");
        }
    }

    #[tokio::test]
    async fn wide_rows_load_and_fail_the_shape_check() {
        let path = temp_path("wide.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(
            &path,
            r#"{"sheets":[{"name":"s","columns":["Iteration"],"rows":[[1,"extra"]]}]}"#,
        )
        .await
        .unwrap();

        let loaded = load_workbook(&path).await.expect("load");
        let err = check_shape(&loaded.sheets[0]).unwrap_err();
        assert!(err.to_string().contains("row 1 has 2 cells"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let path = temp_path("broken.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = load_workbook(&path).await.unwrap_err();
        assert!(matches!(err, AnswerLabError::Parse { .. }));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
