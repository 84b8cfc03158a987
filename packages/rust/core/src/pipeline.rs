//! End-to-end `extract` pipeline: raw workbook → per-cell extraction → cleaned workbook.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, trace, warn};

use answerlab_extract::{Plan, Variant, extract_cell};
use answerlab_shared::{
    AnswerLabError, Cell, ExtractConfig, Result, RunId, Sheet, Workbook, WorkbookMeta,
    validate_extract_config,
};
use answerlab_workbook::{
    LoadOptions, check_shape, load_workbook, load_workbook_with, sanitize_sheet_name,
    save_workbook,
};

/// Configuration for the `extract` pipeline.
#[derive(Debug, Clone)]
pub struct ExtractRunConfig {
    /// Raw workbook to read.
    pub input_path: PathBuf,
    /// Cleaned workbook to create or update (variant suffix already applied).
    pub output_path: PathBuf,
    /// Sheets to process; empty means all.
    pub sheets: Vec<String>,
    /// Extraction variant.
    pub variant: Variant,
    /// Rows above the header in spreadsheet input.
    pub title_rows: u32,
    /// Tool version string recorded in the output.
    pub tool_version: String,
}

impl ExtractRunConfig {
    /// Resolve an `[extract]` config section against `base_dir`.
    pub fn from_config(
        config: &ExtractConfig,
        base_dir: &Path,
        tool_version: impl Into<String>,
    ) -> Result<Self> {
        validate_extract_config(config)?;
        let variant: Variant = config.variant.parse()?;

        let output_name = suffixed_file_name(&config.output_file, variant.output_suffix());
        Ok(Self {
            input_path: base_dir.join(&config.input_file),
            output_path: base_dir.join(&config.output_dir).join(output_name),
            sheets: config.sheets_to_process.clone(),
            variant,
            title_rows: config.title_rows,
            tool_version: tool_version.into(),
        })
    }
}

/// Insert `suffix` between the file stem and its extension.
pub fn suffixed_file_name(file_name: &str, suffix: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    }
}

/// Result of the `extract` pipeline.
#[derive(Debug)]
pub struct ExtractSummary {
    /// Run identifier stamped into the output.
    pub run_id: RunId,
    /// Where the cleaned workbook was written.
    pub output_path: PathBuf,
    /// `true` if an existing output file was updated rather than created.
    pub updated_existing: bool,
    /// Output names of the sheets that were written.
    pub sheets_written: Vec<String>,
    /// Requested sheets not present in the input.
    pub sheets_missing: Vec<String>,
    /// Sheets skipped, with the reason.
    pub sheets_skipped: Vec<(String, String)>,
    /// Response cells run through extraction.
    pub cells_extracted: usize,
    /// Of those, cells that came back empty.
    pub cells_empty: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each sheet is processed.
    fn sheet_started(&self, name: &str, current: usize, total: usize);
    /// Called when a sheet is skipped or fails.
    fn sheet_skipped(&self, name: &str, reason: &str);
    /// Called when the pipeline completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sheet_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn sheet_skipped(&self, _name: &str, _reason: &str) {}
    fn done(&self) {}
}

/// Per-sheet extraction counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SheetStats {
    pub cells: usize,
    pub empty: usize,
}

/// Run the full `extract` pipeline.
///
/// 1. Load the raw workbook and pick the sheets to process
/// 2. Load the existing output workbook, if any, so untouched sheets survive
/// 3. Extract every response cell of every sheet with an `Iteration` column
/// 4. Write the cleaned workbook
#[instrument(skip_all, fields(input = %config.input_path.display(), variant = %config.variant))]
pub async fn run_extract(
    config: &ExtractRunConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExtractSummary> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, output = %config.output_path.display(), "starting extract pipeline");

    // --- Phase 1: Input ---
    progress.phase("Loading raw responses");
    if !config.input_path.exists() {
        return Err(AnswerLabError::config(format!(
            "input file not found at '{}'",
            config.input_path.display()
        )));
    }
    let options = LoadOptions {
        title_rows: config.title_rows,
    };
    let input = load_workbook_with(&config.input_path, options).await?;

    let (selected, sheets_missing) = select_sheets(&input, &config.sheets);
    if !sheets_missing.is_empty() {
        warn!(missing = ?sheets_missing, "requested sheets not found, skipping them");
    }
    info!(count = selected.len(), "sheets to process");

    // --- Phase 2: Existing output ---
    let updated_existing = config.output_path.exists();
    let mut output = if updated_existing {
        load_workbook(&config.output_path).await?
    } else {
        Workbook::default()
    };

    // --- Phase 3: Extraction ---
    progress.phase("Extracting answers");
    let plan = config.variant.plan();
    let total = selected.len();
    let mut written_names: HashSet<String> = HashSet::new();
    let mut sheets_written = Vec::new();
    let mut sheets_skipped = Vec::new();
    let mut stats = SheetStats::default();

    for (i, sheet) in selected.iter().enumerate() {
        progress.sheet_started(&sheet.name, i + 1, total);

        if let Err(err) = check_shape(sheet) {
            let reason = err.to_string();
            warn!(sheet = %sheet.name, %reason, "skipping sheet");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        }

        let Some((cleaned, sheet_stats)) = extract_sheet(sheet, &plan) else {
            let reason = "no 'Iteration' column".to_string();
            info!(sheet = %sheet.name, "skipping sheet without an Iteration column");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        };

        if !written_names.insert(cleaned.name.clone()) {
            let reason = format!(
                "output name '{}' is already used by another sheet",
                cleaned.name
            );
            warn!(sheet = %sheet.name, %reason, "skipping sheet");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        }

        stats.cells += sheet_stats.cells;
        stats.empty += sheet_stats.empty;
        sheets_written.push(cleaned.name.clone());
        output.upsert_sheet(cleaned);
    }

    // --- Phase 4: Write ---
    progress.phase("Writing cleaned workbook");
    output.meta = Some(WorkbookMeta::now(run_id.clone(), &config.tool_version));
    save_workbook(&config.output_path, &output).await?;

    let summary = ExtractSummary {
        run_id,
        output_path: config.output_path.clone(),
        updated_existing,
        sheets_written,
        sheets_missing,
        sheets_skipped,
        cells_extracted: stats.cells,
        cells_empty: stats.empty,
        elapsed: start.elapsed(),
    };

    info!(
        sheets = summary.sheets_written.len(),
        cells = summary.cells_extracted,
        empty = summary.cells_empty,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "extract pipeline complete"
    );
    progress.done();

    Ok(summary)
}

/// The sheets to process, in the order they were requested (or file order
/// when none were requested), plus requested names that do not exist.
pub fn select_sheets<'a>(
    workbook: &'a Workbook,
    requested: &[String],
) -> (Vec<&'a Sheet>, Vec<String>) {
    if requested.is_empty() {
        return (workbook.sheets.iter().collect(), Vec::new());
    }

    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for name in requested {
        match workbook.sheet(name) {
            Some(sheet) => selected.push(sheet),
            None => missing.push(name.clone()),
        }
    }
    (selected, missing)
}

/// Replace every response cell of `sheet` with its extracted answer.
///
/// The `Iteration` column is copied unchanged. Returns `None` when the sheet
/// has no `Iteration` column.
pub fn extract_sheet(sheet: &Sheet, plan: &Plan) -> Option<(Sheet, SheetStats)> {
    let iteration = sheet.iteration_column()?;
    let mut stats = SheetStats::default();

    let rows: Vec<Vec<Cell>> = (0..sheet.rows.len())
        .map(|r| {
            (0..sheet.columns.len())
                .map(|c| {
                    let cell = sheet.cell(r, c);
                    if c == iteration {
                        return cell.clone();
                    }
                    let answer = extract_cell(cell, plan);
                    stats.cells += 1;
                    if answer.is_empty() {
                        stats.empty += 1;
                    }
                    trace!(
                        sheet = %sheet.name,
                        row = r,
                        column = %sheet.columns[c],
                        answer = %answer,
                        "cell extracted"
                    );
                    Cell::Text(answer)
                })
                .collect()
        })
        .collect();

    Some((
        Sheet {
            name: sanitize_sheet_name(&sheet.name),
            columns: sheet.columns.clone(),
            rows,
        },
        stats,
    ))
}
