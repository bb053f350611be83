//! `fuelmix-cli` binary: argument parsing and subcommand dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fuelmix_cli::output::OutputFormat;
use fuelmix_lib::{AggregationMode, ExportFormat, SolverStrategy};

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about = "EU ETS / FuelEU Maritime fuel-mix cost model")]
struct Cli {
    /// Override the regulatory data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format for results written to stdout.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the fuels in the regulatory data set.
    Fuels {
        /// Show prices for this compliance year instead of the generic ones.
        #[arg(long)]
        year: Option<u16>,
    },
    /// Score the blends given in a scenario file without optimising.
    Evaluate {
        /// Scenario JSON file; every fuel leg needs a `blend`.
        scenario: PathBuf,
    },
    /// Find the cheapest blend for every leg of a scenario.
    Optimize(OptimizeArgs),
    /// Optimise a scenario over a grid of years and CO2 prices.
    Sweep(SweepArgs),
}

#[derive(clap::Args, Debug)]
struct OptimizeArgs {
    /// Scenario JSON file.
    scenario: PathBuf,
    /// Search strategy (overrides the scenario's optimizer section).
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
    /// FuelEU aggregation across legs.
    #[arg(long, value_enum)]
    aggregation: Option<AggregationArg>,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Iteration budget.
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    optimize: OptimizeArgs,
    /// Compliance years (comma separated); defaults to 2025-2050 in steps of 5.
    #[arg(long, value_delimiter = ',')]
    years: Vec<u16>,
    /// CO2 prices in EUR/t (comma separated); defaults to 90-190 in steps of 20.
    #[arg(long = "co2-prices", value_delimiter = ',')]
    co2_prices: Vec<f64>,
    /// Write records to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Export format; inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    export: Option<ExportArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    #[value(alias = "de")]
    DifferentialEvolution,
    #[value(alias = "pg")]
    ProjectedGradient,
}

impl From<StrategyArg> for SolverStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::DifferentialEvolution => SolverStrategy::DifferentialEvolution,
            StrategyArg::ProjectedGradient => SolverStrategy::ProjectedGradient,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AggregationArg {
    Pooled,
    PerLeg,
}

impl From<AggregationArg> for AggregationMode {
    fn from(value: AggregationArg) -> Self {
        match value {
            AggregationArg::Pooled => AggregationMode::Pooled,
            AggregationArg::PerLeg => AggregationMode::PerLeg,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportArg {
    Json,
    Csv,
}

impl From<ExportArg> for ExportFormat {
    fn from(value: ExportArg) -> Self {
        match value {
            ExportArg::Json => ExportFormat::Json,
            ExportArg::Csv => ExportFormat::Csv,
        }
    }
}

impl OptimizeArgs {
    fn overrides(&self) -> commands::optimize::Overrides {
        commands::optimize::Overrides {
            strategy: self.strategy.map(Into::into),
            aggregation: self.aggregation.map(Into::into),
            seed: self.seed,
            max_iterations: self.max_iterations,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Command::Fuels { year } => commands::fuels::handle_fuels(data_dir, year, cli.format),
        Command::Evaluate { scenario } => {
            commands::evaluate::handle_evaluate(data_dir, &scenario, cli.format)
        }
        Command::Optimize(args) => commands::optimize::handle_optimize(
            data_dir,
            &args.scenario,
            &args.overrides(),
            cli.format,
        ),
        Command::Sweep(args) => {
            let request = commands::sweep::SweepRequest {
                scenario: args.optimize.scenario.clone(),
                overrides: args.optimize.overrides(),
                years: args.years,
                co2_prices: args.co2_prices,
                output: args.output,
                export: args.export.map(Into::into),
            };
            commands::sweep::handle_sweep(data_dir, &request, cli.format)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
