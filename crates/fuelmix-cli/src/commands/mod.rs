//! Handlers for the CLI subcommands.
//!
//! `main.rs` parses arguments and dispatches here; each module owns one subcommand.

pub mod evaluate;
pub mod fuels;
pub mod optimize;
pub mod sweep;

use std::path::Path;

use anyhow::{Context, Result};

use fuelmix_lib::{load_regulatory_data, resolve_data_dir, RegulatoryData, Scenario};

/// Resolve the data directory and load the regulatory tables from it.
pub fn load_data(data_dir: Option<&Path>) -> Result<RegulatoryData> {
    let dir = resolve_data_dir(data_dir)
        .context("failed to locate the regulatory data directory; pass --data-dir or set FUELMIX_DATA_DIR")?;
    load_regulatory_data(&dir)
        .with_context(|| format!("failed to load regulatory data from {}", dir.display()))
}

/// Read and validate a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    Scenario::from_path(path)
        .with_context(|| format!("failed to read scenario from {}", path.display()))
}
