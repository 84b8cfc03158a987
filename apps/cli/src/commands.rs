//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use answerlab_core::analysis::{AnalysisRunConfig, run_analysis};
use answerlab_core::pipeline::{ExtractRunConfig, ProgressReporter, run_extract};
use answerlab_extract::Variant;
use answerlab_scoring::{Comparator, ExactMatch, MatchingBlocks};
use answerlab_shared::{
    AppConfig, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncReadExt;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// answerlab — extract and score answers from LLM experiment results.
#[derive(Parser)]
#[command(
    name = "answerlab",
    version,
    about = "Extract final answers from LLM responses and score them against references.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.answerlab/answerlab.toml).
    /// Relative paths inside it resolve against its directory.
    #[arg(short, long, global = true, env = "ANSWERLAB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Similarity comparator for `analyse`.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ComparatorKind {
    /// Character matching-blocks ratio.
    MatchingBlocks,
    /// 1.0 for an exact (case-insensitive) match, else 0.0.
    Exact,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract answers from every response cell of a raw results workbook.
    Extract {
        /// Raw workbook (overrides `extract.input_file`).
        #[arg(short, long)]
        input: Option<String>,

        /// Output file name (overrides `extract.output_file`).
        #[arg(short, long)]
        output: Option<String>,

        /// Output directory (overrides `extract.output_dir`).
        #[arg(long)]
        output_dir: Option<String>,

        /// Variant: stable, maths, or integral (overrides `extract.variant`).
        #[arg(long)]
        variant: Option<String>,

        /// Only process this sheet (repeatable; overrides `extract.sheets_to_process`).
        #[arg(long = "sheet")]
        sheets: Vec<String>,

        /// Rows above the header in spreadsheet input (overrides `extract.title_rows`).
        #[arg(long)]
        title_rows: Option<u32>,
    },

    /// Score extracted answers against the reference answers.
    Analyse {
        /// Cleaned workbook (overrides `analysis.input_file`).
        #[arg(short, long)]
        input: Option<String>,

        /// Output file name (overrides `analysis.output_file`).
        #[arg(short, long)]
        output: Option<String>,

        /// Output directory (overrides `analysis.output_dir`).
        #[arg(long)]
        output_dir: Option<String>,

        /// Reference answer (repeatable; replaces `analysis.correct_answers`).
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Comparator used to score each answer.
        #[arg(long, value_enum, default_value = "matching-blocks")]
        comparator: ComparatorKind,
    },

    /// Run extraction on a single response (argument or stdin) and show the result.
    Probe {
        /// Response text. Read from stdin when omitted.
        text: Option<String>,

        /// Variant to run. All variants when omitted.
        #[arg(long)]
        variant: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "answerlab=info",
        1 => "answerlab=debug",
        _ => "answerlab=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Extract {
            input,
            output,
            output_dir,
            variant,
            sheets,
            title_rows,
        } => {
            let overrides = ExtractOverrides {
                input,
                output,
                output_dir,
                variant,
                sheets,
                title_rows,
            };
            cmd_extract(config_path.as_deref(), overrides).await
        }
        Command::Analyse {
            input,
            output,
            output_dir,
            answers,
            comparator,
        } => {
            let overrides = AnalyseOverrides {
                input,
                output,
                output_dir,
                answers,
            };
            cmd_analyse(config_path.as_deref(), overrides, comparator).await
        }
        Command::Probe { text, variant } => cmd_probe(text, variant.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()).await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

/// Load the config and the directory its relative paths resolve against.
fn resolve_config(path: Option<&Path>) -> Result<(AppConfig, PathBuf)> {
    match path {
        Some(p) => {
            let config = load_config_from(p)?;
            let base = p
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base))
        }
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
            Ok((load_config()?, cwd))
        }
    }
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

struct ExtractOverrides {
    input: Option<String>,
    output: Option<String>,
    output_dir: Option<String>,
    variant: Option<String>,
    sheets: Vec<String>,
    title_rows: Option<u32>,
}

async fn cmd_extract(config_path: Option<&Path>, overrides: ExtractOverrides) -> Result<()> {
    let (config, base_dir) = resolve_config(config_path)?;

    let mut extract = config.extract;
    if let Some(input) = overrides.input {
        extract.input_file = input;
    }
    if let Some(output) = overrides.output {
        extract.output_file = output;
    }
    if let Some(dir) = overrides.output_dir {
        extract.output_dir = dir;
    }
    if let Some(variant) = overrides.variant {
        extract.variant = variant;
    }
    if !overrides.sheets.is_empty() {
        extract.sheets_to_process = overrides.sheets;
    }
    if let Some(rows) = overrides.title_rows {
        extract.title_rows = rows;
    }

    let run_config =
        ExtractRunConfig::from_config(&extract, &base_dir, env!("CARGO_PKG_VERSION"))?;

    info!(
        input = %run_config.input_path.display(),
        variant = %run_config.variant,
        "extracting answers"
    );

    let reporter = CliProgress::new();
    let summary = run_extract(&run_config, &reporter).await?;

    println!();
    println!("  Extraction complete ({} variant)", run_config.variant);
    println!(
        "  Output:  {} ({})",
        summary.output_path.display(),
        if summary.updated_existing { "updated" } else { "created" }
    );
    println!("  Sheets:  {}", summary.sheets_written.len());
    println!("  Cells:   {}", summary.cells_extracted);
    println!("  Empty:   {}", summary.cells_empty);
    if !summary.sheets_missing.is_empty() {
        println!("  Missing: {}", summary.sheets_missing.join(", "));
    }
    for (sheet, reason) in &summary.sheets_skipped {
        println!("  Skipped: '{sheet}' ({reason})");
    }
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();
    println!("  Review the cleaned answers before running `answerlab analyse`.");
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// analyse
// ---------------------------------------------------------------------------

struct AnalyseOverrides {
    input: Option<String>,
    output: Option<String>,
    output_dir: Option<String>,
    answers: Vec<String>,
}

async fn cmd_analyse(
    config_path: Option<&Path>,
    overrides: AnalyseOverrides,
    comparator: ComparatorKind,
) -> Result<()> {
    let (config, base_dir) = resolve_config(config_path)?;

    let mut analysis = config.analysis;
    if let Some(input) = overrides.input {
        analysis.input_file = input;
    }
    if let Some(output) = overrides.output {
        analysis.output_file = output;
    }
    if let Some(dir) = overrides.output_dir {
        analysis.output_dir = dir;
    }
    if !overrides.answers.is_empty() {
        analysis.correct_answers = overrides.answers;
    }

    let run_config =
        AnalysisRunConfig::from_config(&analysis, &base_dir, env!("CARGO_PKG_VERSION"))?;

    let comparator: &dyn Comparator = match comparator {
        ComparatorKind::MatchingBlocks => &MatchingBlocks,
        ComparatorKind::Exact => &ExactMatch,
    };

    info!(
        input = %run_config.input_path.display(),
        references = run_config.references.len(),
        comparator = comparator.name(),
        "analysing answers"
    );

    let reporter = CliProgress::new();
    let summary = run_analysis(&run_config, comparator, &reporter).await?;

    println!();
    println!("  Analysis complete");
    println!("  Output:  {}", summary.output_path.display());
    println!("  Sheets:  {}", summary.sheets_written.len());
    println!("  Cells:   {}", summary.cells_scored);
    println!("  Mean:    {:.3}", summary.mean_score);
    for (sheet, reason) in &summary.sheets_skipped {
        println!("  Skipped: '{sheet}' ({reason})");
    }
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// probe
// ---------------------------------------------------------------------------

async fn cmd_probe(text: Option<String>, variant: Option<&str>) -> Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| eyre!("failed to read stdin: {e}"))?;
            buf
        }
    };

    let variants = match variant {
        Some(name) => vec![name.parse::<Variant>()?],
        None => Variant::ALL.to_vec(),
    };

    for variant in variants {
        match variant.plan().extract(&text) {
            Ok(candidate) => {
                let salvaged = if candidate.salvaged { ", salvaged" } else { "" };
                println!(
                    "{:<9} [{}{salvaged}] {}",
                    variant.as_str(),
                    candidate.strategy,
                    candidate.text
                );
            }
            Err(miss) => println!("{:<9} <empty> ({miss})", variant.as_str()),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = resolve_config(config_path)?;
    if config_path.is_none() {
        println!("# {}", config_file_path()?.display());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn sheet_started(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Sheet [{current}/{total}] {name}"));
    }

    fn sheet_skipped(&self, name: &str, reason: &str) {
        self.spinner
            .println(format!("  - Skipping sheet '{name}' ({reason})"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
