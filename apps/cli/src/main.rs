//! answerlab CLI — answer extraction and scoring for LLM experiment workbooks.
//!
//! Pulls final answers out of free-form model responses and scores them
//! against reference answers.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
