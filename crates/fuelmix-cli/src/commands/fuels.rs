//! Fuels command handler for listing the reference fuel table.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use fuelmix_cli::output::{write_fuel_table, write_json, OutputFormat};
use fuelmix_cli::terminal::ColorPalette;

use super::load_data;

/// Handle the fuels subcommand.
pub fn handle_fuels(data_dir: Option<&Path>, year: Option<u16>, format: OutputFormat) -> Result<()> {
    let data = load_data(data_dir)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &data.fuels_sorted()),
        OutputFormat::Text => write_fuel_table(&mut out, &data, year, &ColorPalette::from_env()),
    }
    .context("failed to write fuel table")
}
