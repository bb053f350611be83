//! Evaluate command handler: scores the blends written in a scenario file.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use fuelmix_cli::output::{write_json, write_voyage, OutputFormat};
use fuelmix_cli::terminal::ColorPalette;

use super::{load_data, load_scenario};

/// Handle the evaluate subcommand.
pub fn handle_evaluate(data_dir: Option<&Path>, scenario: &Path, format: OutputFormat) -> Result<()> {
    let data = load_data(data_dir)?;
    let scenario = load_scenario(scenario)?;
    let breakdown = scenario
        .evaluate(&data)
        .context("failed to evaluate scenario blends")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &breakdown),
        OutputFormat::Text => write_voyage(&mut out, &breakdown, &ColorPalette::from_env()),
    }
    .context("failed to write evaluation")
}
