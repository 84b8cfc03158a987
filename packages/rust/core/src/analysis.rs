//! `analyse` pipeline: cleaned workbook → similarity scores against reference answers.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use answerlab_scoring::{Comparator, score_cell};
use answerlab_shared::{
    AnalysisConfig, AnswerLabError, Cell, Result, RunId, Sheet, Workbook, WorkbookMeta,
    validate_analysis_config,
};
use answerlab_workbook::{check_shape, load_workbook, sanitize_sheet_name, save_workbook};

use crate::pipeline::ProgressReporter;

/// Prefix of every output sheet name.
const ANALYSIS_SHEET_PREFIX: &str = "ANALYSIS_";

/// Configuration for the `analyse` pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisRunConfig {
    /// Cleaned workbook to score.
    pub input_path: PathBuf,
    /// Scored workbook to write.
    pub output_path: PathBuf,
    /// Accepted answers; each cell keeps its best score.
    pub references: Vec<String>,
    /// Tool version string recorded in the output.
    pub tool_version: String,
}

impl AnalysisRunConfig {
    /// Resolve an `[analysis]` config section against `base_dir`.
    pub fn from_config(
        config: &AnalysisConfig,
        base_dir: &Path,
        tool_version: impl Into<String>,
    ) -> Result<Self> {
        validate_analysis_config(config)?;
        Ok(Self {
            input_path: base_dir.join(&config.input_file),
            output_path: base_dir.join(&config.output_dir).join(&config.output_file),
            references: config.correct_answers.clone(),
            tool_version: tool_version.into(),
        })
    }
}

/// Result of the `analyse` pipeline.
#[derive(Debug)]
pub struct AnalysisSummary {
    /// Run identifier stamped into the output.
    pub run_id: RunId,
    /// Where the scored workbook was written.
    pub output_path: PathBuf,
    /// Output names of the sheets that were written.
    pub sheets_written: Vec<String>,
    /// Sheets skipped, with the reason.
    pub sheets_skipped: Vec<(String, String)>,
    /// Cells scored.
    pub cells_scored: usize,
    /// Mean score over all scored cells (0.0 when none).
    pub mean_score: f64,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the full `analyse` pipeline.
#[instrument(
    skip_all,
    fields(input = %config.input_path.display(), comparator = comparator.name())
)]
pub async fn run_analysis(
    config: &AnalysisRunConfig,
    comparator: &dyn Comparator,
    progress: &dyn ProgressReporter,
) -> Result<AnalysisSummary> {
    let start = Instant::now();
    let run_id = RunId::new();

    if config.references.is_empty() {
        return Err(AnswerLabError::validation("at least one reference answer is required"));
    }

    info!(%run_id, references = config.references.len(), "starting analysis pipeline");

    progress.phase("Loading extracted answers");
    if !config.input_path.exists() {
        return Err(AnswerLabError::config(format!(
            "input file not found at '{}'",
            config.input_path.display()
        )));
    }
    let input = load_workbook(&config.input_path).await?;

    progress.phase("Scoring answers");
    let mut output = Workbook::default();
    let mut sheets_written = Vec::new();
    let mut sheets_skipped = Vec::new();
    let mut cells_scored = 0usize;
    let mut score_sum = 0.0;
    let total = input.sheets.len();

    for (i, sheet) in input.sheets.iter().enumerate() {
        progress.sheet_started(&sheet.name, i + 1, total);

        if let Err(err) = check_shape(sheet) {
            let reason = err.to_string();
            warn!(sheet = %sheet.name, %reason, "skipping sheet");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        }

        let Some(scored) = score_sheet(sheet, comparator, &config.references) else {
            let reason = "no 'Iteration' column".to_string();
            info!(sheet = %sheet.name, "skipping sheet without an Iteration column");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        };

        if output.sheet(&scored.name).is_some() {
            let reason = format!(
                "output name '{}' is already used by another sheet",
                scored.name
            );
            warn!(sheet = %sheet.name, %reason, "skipping sheet");
            progress.sheet_skipped(&sheet.name, &reason);
            sheets_skipped.push((sheet.name.clone(), reason));
            continue;
        }

        let iteration = scored.iteration_column();
        for row in &scored.rows {
            for (c, cell) in row.iter().enumerate() {
                if Some(c) == iteration {
                    continue;
                }
                if let Cell::Number(score) = cell {
                    cells_scored += 1;
                    score_sum += *score;
                }
            }
        }

        sheets_written.push(scored.name.clone());
        output.sheets.push(scored);
    }

    progress.phase("Writing analysis workbook");
    output.meta = Some(WorkbookMeta::now(run_id.clone(), &config.tool_version));
    save_workbook(&config.output_path, &output).await?;

    let mean_score = if cells_scored == 0 {
        0.0
    } else {
        score_sum / cells_scored as f64
    };

    let summary = AnalysisSummary {
        run_id,
        output_path: config.output_path.clone(),
        sheets_written,
        sheets_skipped,
        cells_scored,
        mean_score,
        elapsed: start.elapsed(),
    };

    info!(
        sheets = summary.sheets_written.len(),
        cells = summary.cells_scored,
        mean = summary.mean_score,
        "analysis pipeline complete"
    );
    progress.done();

    Ok(summary)
}

/// Output sheet name for an analysed sheet.
pub fn analysis_sheet_name(sheet_name: &str) -> String {
    sanitize_sheet_name(&format!("{ANALYSIS_SHEET_PREFIX}{sheet_name}"))
}

/// Replace every response cell of `sheet` with its best similarity score.
///
/// Returns `None` when the sheet has no `Iteration` column.
pub fn score_sheet(
    sheet: &Sheet,
    comparator: &dyn Comparator,
    references: &[String],
) -> Option<Sheet> {
    let iteration = sheet.iteration_column()?;

    let rows: Vec<Vec<Cell>> = (0..sheet.rows.len())
        .map(|r| {
            (0..sheet.columns.len())
                .map(|c| {
                    let cell = sheet.cell(r, c);
                    if c == iteration {
                        cell.clone()
                    } else {
                        Cell::Number(score_cell(comparator, cell, references))
                    }
                })
                .collect()
        })
        .collect();

    Some(Sheet {
        name: analysis_sheet_name(&sheet.name),
        columns: sheet.columns.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use answerlab_scoring::{ExactMatch, MatchingBlocks};
    use uuid::Uuid;

    fn references() -> Vec<String> {
        vec![
            "1/2*tan(ln(x))^2 + ln(cos(ln(x))) + C".into(),
            "1/2*sec(ln(x))^2 - ln(sec(ln(x))) + C".into(),
        ]
    }

    fn cleaned_sheet() -> Sheet {
        let mut sheet = Sheet::new("temp_0.7", vec!["Iteration".into(), "llama".into()]);
        sheet.rows.push(vec![Cell::Number(1.0), "1/2*sec(ln(x))^2 - ln(sec(ln(x))) + C".into()]);
        sheet.rows.push(vec![Cell::Number(2.0), Cell::Empty]);
        sheet
    }

    #[test]
    fn sheet_names_are_prefixed_and_truncated() {
        assert_eq!(analysis_sheet_name("temp_0.7"), "ANALYSIS_temp_0.7");
        let long = analysis_sheet_name("llama-3.1-70b-instruct:temp_0.7");
        assert_eq!(long, "ANALYSIS_llama-3.1-70b-instruct");
        assert_eq!(long.chars().count(), 31);
    }

    #[test]
    fn score_sheet_scores_cells() {
        let scored = score_sheet(&cleaned_sheet(), &MatchingBlocks, &references()).expect("sheet");
        assert_eq!(scored.name, "ANALYSIS_temp_0.7");
        assert_eq!(scored.cell(0, 0), &Cell::Number(1.0));
        assert_eq!(scored.cell(0, 1), &Cell::Number(1.0));
        assert_eq!(scored.cell(1, 1), &Cell::Number(0.0));
    }

    #[test]
    fn score_sheet_uses_given_comparator() {
        let mut sheet = cleaned_sheet();
        sheet.rows[0][1] = "1/2*sec(ln(x))^2 + C".into();
        let scored = score_sheet(&sheet, &ExactMatch, &references()).expect("sheet");
        assert_eq!(scored.cell(0, 1), &Cell::Number(0.0));
    }

    #[test]
    fn from_config_requires_references() {
        let cfg = AnalysisConfig {
            input_file: "in.json".into(),
            output_file: "out.json".into(),
            ..AnalysisConfig::default()
        };
        assert!(AnalysisRunConfig::from_config(&cfg, Path::new("."), "0.1.0").is_err());
    }

    #[tokio::test]
    async fn run_analysis_writes_scores() {
        let dir = std::env::temp_dir().join(format!("answerlab-analysis-{}", Uuid::now_v7()));
        let input_path = dir.join("clean.json");
        let input = Workbook {
            meta: None,
            sheets: vec![cleaned_sheet(), Sheet::new("notes", vec!["text".into()])],
        };
        save_workbook(&input_path, &input).await.expect("seed");

        let config = AnalysisRunConfig {
            input_path,
            output_path: dir.join("results").join("final.json"),
            references: references(),
            tool_version: "test".into(),
        };
        let summary = run_analysis(&config, &MatchingBlocks, &SilentProgress)
            .await
            .expect("analysis");

        assert_eq!(summary.sheets_written, vec!["ANALYSIS_temp_0.7".to_string()]);
        assert_eq!(summary.sheets_skipped.len(), 1);
        assert_eq!(summary.cells_scored, 2);
        assert!((summary.mean_score - 0.5).abs() < 1e-9);

        let output = load_workbook(&config.output_path).await.expect("reload");
        assert_eq!(output.sheet_names(), vec!["ANALYSIS_temp_0.7"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn run_analysis_skips_colliding_and_ragged_sheets() {
        let dir = std::env::temp_dir().join(format!("answerlab-analysis-{}", Uuid::now_v7()));
        let input_path = dir.join("clean.json");

        let mut first = cleaned_sheet();
        first.name = "a:b".into();
        let mut second = cleaned_sheet();
        second.name = "a/b".into();
        let mut ragged = Sheet::new("ragged", vec!["Iteration".into()]);
        ragged.rows.push(vec![Cell::Number(1.0), "x + C".into()]);
        let input = Workbook {
            meta: None,
            sheets: vec![first, second, ragged],
        };
        save_workbook(&input_path, &input).await.expect("seed");

        let config = AnalysisRunConfig {
            input_path,
            output_path: dir.join("results").join("final.json"),
            references: references(),
            tool_version: "test".into(),
        };
        let summary = run_analysis(&config, &MatchingBlocks, &SilentProgress)
            .await
            .expect("analysis");

        assert_eq!(summary.sheets_written, vec!["ANALYSIS_a_b".to_string()]);
        assert_eq!(summary.sheets_skipped.len(), 2);
        assert_eq!(summary.sheets_skipped[0].0, "a/b");
        assert!(summary.sheets_skipped[0].1.contains("already used"));
        assert_eq!(summary.sheets_skipped[1].0, "ragged");
        assert!(summary.sheets_skipped[1].1.contains("row 1 has 2 cells"));

        let output = load_workbook(&config.output_path).await.expect("reload");
        assert_eq!(output.sheet_names(), vec!["ANALYSIS_a_b"]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
