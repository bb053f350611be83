use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::voyage::AggregationMode;

/// Search strategy used to minimise the voyage cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverStrategy {
    /// Population-based global search; handles the non-smooth objective.
    #[default]
    DifferentialEvolution,
    /// Local descent with projection onto the feasible region.
    ProjectedGradient,
}

impl SolverStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStrategy::DifferentialEvolution => "differential-evolution",
            SolverStrategy::ProjectedGradient => "projected-gradient",
        }
    }
}

impl fmt::Display for SolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "differential-evolution" | "de" => Ok(SolverStrategy::DifferentialEvolution),
            "projected-gradient" | "gradient" | "pg" => Ok(SolverStrategy::ProjectedGradient),
            other => Err(Error::invalid_scenario(format!(
                "unknown solver strategy '{other}'"
            ))),
        }
    }
}

/// Tuning knobs for the optimizer; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub strategy: SolverStrategy,
    pub aggregation: AggregationMode,
    /// Generations (DE) or descent steps (projected gradient).
    pub max_iterations: usize,
    /// Wall-clock budget; the best point found so far is returned when it runs out.
    pub max_seconds: Option<f64>,
    /// Relative convergence tolerance on the objective.
    pub tolerance: f64,
    /// Relative tolerance on reconstructed leg energy.
    pub energy_tolerance: f64,
    /// Population members per decision variable.
    pub population_size: usize,
    /// Dithering range for the DE mutation factor.
    pub mutation: (f64, f64),
    /// DE crossover probability.
    pub recombination: f64,
    /// Refine the DE result with a block-vertex sweep and a local descent.
    pub polish: bool,
    pub seed: Option<u64>,
    /// Evaluate the population on the rayon thread pool.
    pub parallel: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: SolverStrategy::default(),
            aggregation: AggregationMode::default(),
            max_iterations: 1000,
            max_seconds: None,
            tolerance: 1e-6,
            energy_tolerance: 1e-3,
            population_size: 15,
            mutation: (0.5, 1.0),
            recombination: 0.9,
            polish: true,
            seed: None,
            parallel: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_strategy(mut self, strategy: SolverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::invalid_scenario("max_iterations must be at least 1"));
        }
        if let Some(seconds) = self.max_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(Error::invalid_scenario(format!(
                    "max_seconds must be a finite positive number, got {seconds}"
                )));
            }
        }
        for (value, field) in [
            (self.tolerance, "tolerance"),
            (self.energy_tolerance, "energy_tolerance"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_scenario(format!(
                    "{field} must be a finite positive number, got {value}"
                )));
            }
        }
        if self.population_size == 0 {
            return Err(Error::invalid_scenario("population_size must be at least 1"));
        }
        let (low, high) = self.mutation;
        if !(0.0..=2.0).contains(&low) || !(0.0..=2.0).contains(&high) || low > high {
            return Err(Error::invalid_scenario(format!(
                "mutation must be an ordered range within [0, 2], got ({low}, {high})"
            )));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(Error::invalid_scenario(format!(
                "recombination must be within [0, 1], got {}",
                self.recombination
            )));
        }
        Ok(())
    }
}
