//! Sweep command handler: optimises one scenario over a year × CO2 price grid.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use fuelmix_cli::output::{write_sweep_summary, OutputFormat};
use fuelmix_cli::terminal::ColorPalette;
use fuelmix_lib::{export_sweep, run_sweep, write_sweep, ExportFormat, SweepGrid};

use super::optimize::Overrides;
use super::{load_data, load_scenario};

/// Parsed sweep arguments.
#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub scenario: PathBuf,
    pub overrides: Overrides,
    pub years: Vec<u16>,
    pub co2_prices: Vec<f64>,
    pub output: Option<PathBuf>,
    pub export: Option<ExportFormat>,
}

impl SweepRequest {
    /// Grid built from the requested axes, falling back to the default axis when one is empty.
    pub fn grid(&self) -> SweepGrid {
        let defaults = SweepGrid::default();
        SweepGrid::new(
            if self.years.is_empty() {
                defaults.years
            } else {
                self.years.clone()
            },
            if self.co2_prices.is_empty() {
                defaults.co2_prices
            } else {
                self.co2_prices.clone()
            },
        )
    }

    /// File export format: explicit flag, then the output extension, then CSV.
    fn export_format(&self, path: &Path) -> ExportFormat {
        self.export
            .or_else(|| ExportFormat::from_path(path))
            .unwrap_or(ExportFormat::Csv)
    }
}

/// Handle the sweep subcommand.
///
/// With `--output` the records go to that file and a summary is printed;
/// otherwise the records themselves are written to stdout.
pub fn handle_sweep(data_dir: Option<&Path>, request: &SweepRequest, format: OutputFormat) -> Result<()> {
    let data = load_data(data_dir)?;
    let mut scenario = load_scenario(&request.scenario)?;
    request.overrides.apply(&mut scenario);

    let records = run_sweep(&data, &scenario, &request.grid()).context("scenario sweep failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &request.output {
        Some(path) => {
            let export = request.export_format(path);
            export_sweep(path, &records, export)
                .with_context(|| format!("failed to write sweep results to {}", path.display()))?;
            info!(path = %path.display(), format = %export, "sweep results written");
            write_sweep_summary(&mut out, &records, path, &ColorPalette::from_env())
                .context("failed to write sweep summary")
        }
        None => {
            let export = request.export.unwrap_or(match format {
                OutputFormat::Json => ExportFormat::Json,
                OutputFormat::Text => ExportFormat::Csv,
            });
            write_sweep(&mut out, &records, export).context("failed to write sweep results")
        }
    }
}
