//! Projected-gradient descent with finite-difference gradients.

use tracing::{debug, info};

use crate::error::{Error, Result};

use super::config::{OptimizerConfig, SolverStrategy};
use super::projection::{project, SHARE_CAP};
use super::solver::{converged, BlendSolver, Deadline, Objective, OptimizationStatus, SolverOutcome};

/// Finite-difference step in percentage points.
const FD_STEP: f64 = 1e-3;
/// Sufficient-decrease constant of the Armijo test.
const ARMIJO_SIGMA: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;

/// Local solver: steepest descent projected onto the feasible region.
///
/// Fast on the smooth parts of the cost surface; kinks at a zero compliance
/// balance are handled by the backtracking line search only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedGradient;

/// Result of one descent run.
#[derive(Debug, Clone)]
pub(crate) struct Descent {
    pub(crate) x: Vec<f64>,
    pub(crate) value: f64,
    pub(crate) iterations: usize,
    pub(crate) evaluations: usize,
    pub(crate) converged: bool,
}

impl BlendSolver for ProjectedGradient {
    fn strategy(&self) -> SolverStrategy {
        SolverStrategy::ProjectedGradient
    }

    fn minimize(
        &self,
        objective: &dyn Objective,
        starts: &[Vec<f64>],
        config: &OptimizerConfig,
    ) -> Result<SolverOutcome> {
        let deadline = Deadline::from_config(config);
        let origin = vec![0.0; objective.dimension()];
        let starts: Vec<&[f64]> = if starts.is_empty() {
            vec![origin.as_slice()]
        } else {
            starts.iter().map(Vec::as_slice).collect()
        };

        let mut best: Option<Descent> = None;
        let mut iterations = 0;
        let mut evaluations = 0;
        for start in starts {
            if start.len() != objective.dimension() {
                return Err(Error::invalid_scenario(format!(
                    "start point has {} variables, expected {}",
                    start.len(),
                    objective.dimension()
                )));
            }
            let run = descend(objective, start, config.max_iterations, config.tolerance, deadline)?;
            iterations += run.iterations;
            evaluations += run.evaluations;
            if best.as_ref().map_or(true, |b| run.value < b.value) {
                best = Some(run);
            }
        }

        let Some(best) = best else {
            return Err(Error::invalid_scenario("no start point for projected gradient"));
        };
        let status = if best.converged {
            OptimizationStatus::Converged
        } else {
            OptimizationStatus::BudgetExhausted
        };
        info!(
            strategy = %self.strategy(),
            ?status,
            iterations,
            evaluations,
            objective = best.value,
            "projected gradient finished"
        );

        Ok(SolverOutcome {
            x: best.x,
            value: best.value,
            status,
            iterations,
            evaluations,
        })
    }
}

/// Descend from `start` until the objective stalls or the budget runs out.
pub(crate) fn descend(
    objective: &dyn Objective,
    start: &[f64],
    max_iterations: usize,
    tolerance: f64,
    deadline: Deadline,
) -> Result<Descent> {
    let blocks = objective.blocks();
    let mut x = start.to_vec();
    project(&mut x, blocks);
    let mut value = objective.evaluate(&x)?;
    let mut evaluations = 1;

    let finish = |x: Vec<f64>, value: f64, iterations: usize, evaluations: usize, converged: bool| {
        Descent {
            x,
            value,
            iterations,
            evaluations,
            converged,
        }
    };

    if x.is_empty() {
        return Ok(finish(x, value, 0, evaluations, true));
    }

    for iteration in 1..=max_iterations {
        if deadline.expired() {
            return Ok(finish(x, value, iteration - 1, evaluations, false));
        }

        let (grad, used) = gradient(objective, &x, value)?;
        evaluations += used;
        let norm = grad.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
        if norm == 0.0 {
            return Ok(finish(x, value, iteration, evaluations, true));
        }

        let mut step = SHARE_CAP / norm;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let mut trial: Vec<f64> = x.iter().zip(&grad).map(|(xi, gi)| xi - step * gi).collect();
            project(&mut trial, blocks);
            let slope: f64 = grad
                .iter()
                .zip(trial.iter().zip(&x))
                .map(|(g, (t, xi))| g * (t - xi))
                .sum();
            if slope >= 0.0 {
                break;
            }
            let trial_value = objective.evaluate(&trial)?;
            evaluations += 1;
            if trial_value <= value + ARMIJO_SIGMA * slope {
                accepted = Some((trial, trial_value));
                break;
            }
            step *= 0.5;
        }

        let Some((trial, trial_value)) = accepted else {
            return Ok(finish(x, value, iteration, evaluations, true));
        };
        let done = converged(value, trial_value, tolerance);
        debug!(iteration, objective = trial_value, step, "projected gradient step");
        x = trial;
        value = trial_value;
        if done {
            return Ok(finish(x, value, iteration, evaluations, true));
        }
    }

    Ok(finish(x, value, max_iterations, evaluations, false))
}

/// Finite-difference gradient that never probes outside the feasible region.
///
/// Central differences in the interior, one-sided differences on a bound.
fn gradient(objective: &dyn Objective, x: &[f64], value: f64) -> Result<(Vec<f64>, usize)> {
    let mut grad = vec![0.0; x.len()];
    let mut evaluations = 0;
    let mut probe = x.to_vec();

    for block in objective.blocks() {
        let slack = SHARE_CAP - x[block.clone()].iter().sum::<f64>();
        for i in block.clone() {
            let can_up = x[i] + FD_STEP <= SHARE_CAP && slack >= FD_STEP;
            let can_down = x[i] - FD_STEP >= 0.0;

            let mut eval_at = |offset: f64| -> Result<f64> {
                probe[i] = x[i] + offset;
                let v = objective.evaluate(&probe);
                probe[i] = x[i];
                evaluations += 1;
                v
            };

            grad[i] = match (can_down, can_up) {
                (true, true) => (eval_at(FD_STEP)? - eval_at(-FD_STEP)?) / (2.0 * FD_STEP),
                (false, true) => (eval_at(FD_STEP)? - value) / FD_STEP,
                (true, false) => (value - eval_at(-FD_STEP)?) / FD_STEP,
                (false, false) => 0.0,
            };
        }
    }

    Ok((grad, evaluations))
}
