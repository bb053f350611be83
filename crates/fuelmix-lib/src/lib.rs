//! Fuel-mix library entry points.
//!
//! This crate loads the EU regulatory reference tables, prices fuel blends
//! under the EU ETS and FuelEU Maritime regimes, and searches for the blend
//! that minimises a voyage's regulatory-adjusted cost. Higher-level
//! consumers (the CLI, benches) should only depend on the functions exported
//! here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod blend;
pub mod breakdown;
pub mod error;
pub mod leg;
pub mod optimizer;
pub mod output;
pub mod penalty;
pub mod regulatory;
pub mod scenario;
pub mod sweep;
pub mod voyage;

pub use blend::FuelBlend;
pub use breakdown::{CostBreakdown, FuelCost};
pub use error::{Error, Result};
pub use leg::{evaluate_leg, LegResult, OpsConfig, ScenarioParams, TripKind, TripLeg};
pub use optimizer::{
    optimize_leg, optimize_voyage, OptimizationStatus, OptimizedVoyage, OptimizerConfig,
    SolverStrategy,
};
pub use output::{export_sweep, write_sweep, ExportFormat};
pub use regulatory::{
    load_regulatory_data, resolve_data_dir, FuelProperties, PriceBounds, PriceSchedule,
    RegulatoryData, RegulatoryTargets,
};
pub use scenario::{LegSpec, Scenario};
pub use sweep::{run_sweep, SweepGrid, SweepRecord};
pub use voyage::{aggregate, evaluate_voyage, AggregationMode, VoyageBreakdown};
