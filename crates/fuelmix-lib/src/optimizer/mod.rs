//! Cost-minimising fuel-mix search.
//!
//! This module provides:
//! - [`OptimizerConfig`] - Strategy, aggregation mode and solver budgets
//! - [`BlendSolver`] - Strategy trait implemented by [`DifferentialEvolution`]
//!   and [`ProjectedGradient`]
//! - [`VoyageProblem`] - The voyage cost as a function of candidate percentages
//! - [`optimize_voyage`] - Main entry point returning an [`OptimizedVoyage`]
//!
//! Each leg's fixed tonnage is burnt first. The remaining energy is split
//! between the candidate fuels by their decision percentages and the fixed
//! fuel takes whatever share is left, so every point of the search region
//! meets the leg's energy demand. The reported breakdown is recomputed at the
//! returned point and its energy balance re-checked.

mod config;
mod differential;
mod gradient;
mod problem;
mod projection;
mod solver;

pub use config::{OptimizerConfig, SolverStrategy};
pub use differential::DifferentialEvolution;
pub use gradient::ProjectedGradient;
pub use problem::VoyageProblem;
pub use projection::{is_feasible, project, project_block, repair, SHARE_CAP};
pub use solver::{select_solver, BlendSolver, Objective, OptimizationStatus, SolverOutcome};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::leg::{ScenarioParams, TripLeg};
use crate::regulatory::RegulatoryData;
use crate::voyage::{AggregationMode, VoyageBreakdown};

/// Result of an optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedVoyage {
    pub strategy: SolverStrategy,
    pub aggregation: AggregationMode,
    pub status: OptimizationStatus,
    pub iterations: usize,
    pub evaluations: usize,
    /// Total cost at the returned point.
    pub objective: f64,
    /// Total cost with all residual energy on the fixed fuels.
    pub baseline_cost: f64,
    /// Raw decision variables, leg by leg.
    pub decision: Vec<f64>,
    /// Candidate percentages of the residual energy per leg.
    pub shares: Vec<BTreeMap<String, f64>>,
    pub breakdown: VoyageBreakdown,
}

impl OptimizedVoyage {
    /// Cost avoided relative to the fixed-fuel baseline.
    pub fn savings(&self) -> f64 {
        self.baseline_cost - self.objective
    }
}

/// Find the cheapest blend for every leg of a voyage.
pub fn optimize_voyage(
    data: &RegulatoryData,
    legs: &[TripLeg],
    params: &ScenarioParams,
    config: &OptimizerConfig,
) -> Result<OptimizedVoyage> {
    config.validate()?;
    let problem = VoyageProblem::new(data, legs, *params, config.aggregation)?;

    let baseline = problem.baseline();
    let baseline_cost = problem.evaluate(&baseline)?;
    let mut starts = vec![baseline];
    if problem.dimension() > 0 {
        starts.push(problem.even_split());
    }

    let solver = select_solver(config.strategy);
    let outcome = solver.minimize(&problem, &starts, config)?;

    let breakdown = problem.breakdown(&outcome.x)?;
    for (decoder, result) in problem.decoders().zip(&breakdown.legs) {
        if let Some(decoder) = decoder {
            decoder.check_energy(data, &result.blend, config.energy_tolerance)?;
        }
    }

    let objective = breakdown.totals.total_cost;
    info!(
        strategy = %config.strategy,
        aggregation = %config.aggregation,
        status = ?outcome.status,
        objective,
        baseline_cost,
        "voyage optimisation complete"
    );

    Ok(OptimizedVoyage {
        strategy: config.strategy,
        aggregation: config.aggregation,
        status: outcome.status,
        iterations: outcome.iterations,
        evaluations: outcome.evaluations + 1,
        objective,
        baseline_cost,
        shares: problem.shares(&outcome.x)?,
        decision: outcome.x,
        breakdown,
    })
}

/// Optimise a single leg.
pub fn optimize_leg(
    data: &RegulatoryData,
    leg: &TripLeg,
    params: &ScenarioParams,
    config: &OptimizerConfig,
) -> Result<OptimizedVoyage> {
    optimize_voyage(data, std::slice::from_ref(leg), params, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::leg::TripKind;
    use crate::regulatory::{FuelProperties, PriceBounds, PriceSchedule, RegulatoryTargets};

    fn data() -> RegulatoryData {
        let priced = |fuel: FuelProperties, min: f64, max: f64| {
            fuel.with_prices(PriceSchedule::generic(PriceBounds::new(min, max)))
        };
        RegulatoryData::new(
            [
                priced(FuelProperties::new("MDO", 42_700.0, 90.77, 3.206), 700.0, 800.0),
                priced(FuelProperties::new("VLSFO", 41_000.0, 91.4, 3.151), 550.0, 650.0),
                priced(FuelProperties::new("BIO-DIESEL", 37_200.0, 20.8, 2.834), 1_200.0, 1_500.0),
                FuelProperties::new("LNG", 49_100.0, 80.0, 2.75),
            ],
            RegulatoryTargets::new(91.16).with_reduction(2030, 6.0),
        )
        .unwrap()
    }

    fn config(strategy: SolverStrategy) -> OptimizerConfig {
        OptimizerConfig::default()
            .with_strategy(strategy)
            .with_seed(42)
            .with_max_iterations(200)
    }

    #[test]
    fn cheaper_candidate_replaces_fixed_fuel() {
        let data = data();
        let leg = TripLeg::new(TripKind::IntraEu, 1.0e6)
            .with_fixed("MDO", 10.0)
            .with_candidates(["VLSFO"]);
        let params = ScenarioParams::new(2030, 100.0);

        for strategy in [
            SolverStrategy::DifferentialEvolution,
            SolverStrategy::ProjectedGradient,
        ] {
            let result = optimize_leg(&data, &leg, &params, &config(strategy)).unwrap();
            assert!(result.objective <= result.baseline_cost);
            assert!(result.shares[0]["VLSFO"] > 99.0, "{strategy}: {:?}", result.shares);
            let leg_result = &result.breakdown.legs[0];
            let total: f64 = leg_result.percentages.values().sum();
            assert!((total - 100.0).abs() < 1e-9);
            assert!((leg_result.blend.tonnes("MDO") - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn infeasible_fixed_tonnage_fails_before_search() {
        let leg = TripLeg::new(TripKind::IntraEu, 1.0e6)
            .with_fixed("MDO", 100.0)
            .with_candidates(["VLSFO"]);
        let err = optimize_leg(
            &data(),
            &leg,
            &ScenarioParams::new(2030, 100.0),
            &config(SolverStrategy::DifferentialEvolution),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InfeasibleRegion { .. }));
    }

    #[test]
    fn unpriced_candidate_is_reported() {
        let leg = TripLeg::new(TripKind::IntraEu, 1.0e6).with_candidates(["LNG"]);
        let err = optimize_leg(
            &data(),
            &leg,
            &ScenarioParams::new(2030, 100.0),
            &config(SolverStrategy::DifferentialEvolution),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownFuel { code, .. } if code == "LNG"));
    }

    #[test]
    fn berth_only_voyage_has_no_variables() {
        let leg = TripLeg::new(TripKind::Berth, 4.27e5);
        let result = optimize_leg(
            &data(),
            &leg,
            &ScenarioParams::new(2030, 100.0),
            &config(SolverStrategy::DifferentialEvolution),
        )
        .unwrap();
        assert!(result.decision.is_empty());
        assert_eq!(result.status, OptimizationStatus::Converged);
        assert_eq!(result.objective, result.baseline_cost);
    }
}
