//! Solver strategies behind a common trait.

use std::fmt;
use std::ops::Range;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::config::{OptimizerConfig, SolverStrategy};
use super::differential::DifferentialEvolution;
use super::gradient::ProjectedGradient;

/// A cost function over the product of capped simplices.
///
/// Implementations must be pure so that points can be scored concurrently.
pub trait Objective: Sync {
    /// Number of decision variables.
    fn dimension(&self) -> usize;

    /// Index ranges of the simplex blocks partitioning the variables.
    fn blocks(&self) -> &[Range<usize>];

    /// Cost at a feasible point.
    fn evaluate(&self, x: &[f64]) -> Result<f64>;
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationStatus {
    Converged,
    /// Iteration or time budget ran out; the best point found is returned.
    BudgetExhausted,
}

impl OptimizationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationStatus::Converged => "converged",
            OptimizationStatus::BudgetExhausted => "budget-exhausted",
        }
    }
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best point found by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub x: Vec<f64>,
    pub value: f64,
    pub status: OptimizationStatus,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Strategy for minimising an [`Objective`].
pub trait BlendSolver: Send + Sync {
    /// The strategy identifier for this solver.
    fn strategy(&self) -> SolverStrategy;

    /// Minimise `objective`, seeding the search with the feasible points in `starts`.
    fn minimize(
        &self,
        objective: &dyn Objective,
        starts: &[Vec<f64>],
        config: &OptimizerConfig,
    ) -> Result<SolverOutcome>;
}

/// Pick the solver implementation for a configured strategy.
pub fn select_solver(strategy: SolverStrategy) -> Box<dyn BlendSolver> {
    match strategy {
        SolverStrategy::DifferentialEvolution => Box::new(DifferentialEvolution),
        SolverStrategy::ProjectedGradient => Box::new(ProjectedGradient),
    }
}

/// Wall-clock budget shared by the solvers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn from_config(config: &OptimizerConfig) -> Self {
        Deadline(
            config
                .max_seconds
                .map(|seconds| Instant::now() + Duration::from_secs_f64(seconds)),
        )
    }

    pub(crate) fn expired(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Relative convergence test on two objective values.
pub(crate) fn converged(previous: f64, current: f64, tolerance: f64) -> bool {
    (previous - current).abs() <= tolerance * previous.abs().max(current.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_solver_matches_strategy() {
        for strategy in [
            SolverStrategy::DifferentialEvolution,
            SolverStrategy::ProjectedGradient,
        ] {
            assert_eq!(select_solver(strategy).strategy(), strategy);
        }
    }

    #[test]
    fn unlimited_deadline_never_expires() {
        let deadline = Deadline::from_config(&OptimizerConfig::default());
        assert!(!deadline.expired());
    }
}
