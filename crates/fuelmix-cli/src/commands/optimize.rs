//! Optimize command handler.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use fuelmix_cli::output::{write_json, write_optimized, OutputFormat};
use fuelmix_cli::terminal::ColorPalette;
use fuelmix_lib::{AggregationMode, Scenario, SolverStrategy};

use super::{load_data, load_scenario};

/// Command-line settings that take precedence over a scenario's optimizer section.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub strategy: Option<SolverStrategy>,
    pub aggregation: Option<AggregationMode>,
    pub seed: Option<u64>,
    pub max_iterations: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, scenario: &mut Scenario) {
        let config = &mut scenario.optimizer;
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(aggregation) = self.aggregation {
            config.aggregation = aggregation;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
    }
}

/// Handle the optimize subcommand.
pub fn handle_optimize(
    data_dir: Option<&Path>,
    scenario_path: &Path,
    overrides: &Overrides,
    format: OutputFormat,
) -> Result<()> {
    let data = load_data(data_dir)?;
    let mut scenario = load_scenario(scenario_path)?;
    overrides.apply(&mut scenario);

    let result = scenario
        .optimize(&data)
        .with_context(|| format!("failed to optimise {}", scenario_path.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &result),
        OutputFormat::Text => write_optimized(&mut out, &result, &ColorPalette::from_env()),
    }
    .context("failed to write optimisation result")
}
