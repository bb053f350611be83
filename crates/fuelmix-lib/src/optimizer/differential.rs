//! Differential evolution (`best/1/bin`) over the blend percentages.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::config::{OptimizerConfig, SolverStrategy};
use super::gradient::{descend, Descent};
use super::projection::{repair, SHARE_CAP};
use super::solver::{BlendSolver, Deadline, Objective, OptimizationStatus, SolverOutcome};

/// Smallest population that still allows picking two distinct donors.
const MIN_POPULATION: usize = 5;

/// Derivative-free global search; the default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferentialEvolution;

impl BlendSolver for DifferentialEvolution {
    fn strategy(&self) -> SolverStrategy {
        SolverStrategy::DifferentialEvolution
    }

    fn minimize(
        &self,
        objective: &dyn Objective,
        starts: &[Vec<f64>],
        config: &OptimizerConfig,
    ) -> Result<SolverOutcome> {
        let deadline = Deadline::from_config(config);
        let dim = objective.dimension();
        let blocks = objective.blocks();

        if dim == 0 {
            let value = objective.evaluate(&[])?;
            return Ok(SolverOutcome {
                x: Vec::new(),
                value,
                status: OptimizationStatus::Converged,
                iterations: 0,
                evaluations: 1,
            });
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let size = (config.population_size * dim).max(MIN_POPULATION);
        let mut population = latin_hypercube(&mut rng, size, dim);
        for (slot, start) in population.iter_mut().zip(starts) {
            if start.len() != dim {
                return Err(Error::invalid_scenario(format!(
                    "start point has {} variables, expected {dim}",
                    start.len()
                )));
            }
            slot.clone_from(start);
        }
        for member in population.iter_mut() {
            repair(member, blocks);
        }

        let mut costs = evaluate_all(objective, &population, config.parallel)?;
        let mut evaluations = size;
        let mut best = argmin(&costs);
        let mut status = OptimizationStatus::BudgetExhausted;
        let mut iterations = 0;
        let (low, high) = config.mutation;

        for generation in 1..=config.max_iterations {
            if deadline.expired() {
                break;
            }
            iterations = generation;

            let scale = if high > low {
                rng.gen_range(low..high)
            } else {
                low
            };
            let trials: Vec<Vec<f64>> = (0..size)
                .map(|i| {
                    let mut trial = best1bin(
                        &mut rng,
                        &population,
                        i,
                        best,
                        scale,
                        config.recombination,
                    );
                    redraw_out_of_bounds(&mut rng, &mut trial);
                    repair(&mut trial, blocks);
                    trial
                })
                .collect();

            let trial_costs = evaluate_all(objective, &trials, config.parallel)?;
            evaluations += size;

            for (i, (trial, cost)) in trials.into_iter().zip(trial_costs).enumerate() {
                if cost <= costs[i] {
                    population[i] = trial;
                    costs[i] = cost;
                    if cost < costs[best] {
                        best = i;
                    }
                }
            }

            let (mean, spread) = mean_and_spread(&costs);
            debug!(
                generation,
                best = costs[best],
                mean,
                spread,
                "differential evolution generation"
            );
            if spread <= config.tolerance * mean.abs() {
                status = OptimizationStatus::Converged;
                break;
            }
        }

        let mut x = population[best].clone();
        let mut value = costs[best];

        if config.polish && !deadline.expired() {
            let swept = vertex_sweep(objective, &x, value, deadline)?;
            evaluations += swept.evaluations;
            if swept.value < value {
                debug!(before = value, after = swept.value, "vertex sweep improved the best member");
                x = swept.x;
                value = swept.value;
            }

            let polished = descend(objective, &x, config.max_iterations, config.tolerance, deadline)?;
            evaluations += polished.evaluations;
            if polished.value < value {
                debug!(before = value, after = polished.value, "polish improved the best member");
                x = polished.x;
                value = polished.value;
            }
        }

        info!(
            strategy = %self.strategy(),
            ?status,
            iterations,
            evaluations,
            objective = value,
            "differential evolution finished"
        );

        Ok(SolverOutcome {
            x,
            value,
            status,
            iterations,
            evaluations,
        })
    }
}

/// Stratified initial population on `[0, 100]^dim`.
fn latin_hypercube(rng: &mut StdRng, size: usize, dim: usize) -> Vec<Vec<f64>> {
    let mut population = vec![vec![0.0; dim]; size];
    let mut strata: Vec<usize> = (0..size).collect();
    for j in 0..dim {
        strata.shuffle(rng);
        for (member, stratum) in population.iter_mut().zip(&strata) {
            let u: f64 = rng.gen();
            member[j] = (*stratum as f64 + u) / size as f64 * SHARE_CAP;
        }
    }
    population
}

/// Mutant around the best member crossed over with member `target`.
fn best1bin(
    rng: &mut StdRng,
    population: &[Vec<f64>],
    target: usize,
    best: usize,
    scale: f64,
    recombination: f64,
) -> Vec<f64> {
    let size = population.len();
    let dim = population[target].len();

    let mut pick = |exclude: &[usize]| loop {
        let candidate = rng.gen_range(0..size);
        if !exclude.contains(&candidate) {
            break candidate;
        }
    };
    let r1 = pick(&[target]);
    let r2 = pick(&[target, r1]);

    let forced = rng.gen_range(0..dim);
    (0..dim)
        .map(|j| {
            if j == forced || rng.gen::<f64>() < recombination {
                population[best][j] + scale * (population[r1][j] - population[r2][j])
            } else {
                population[target][j]
            }
        })
        .collect()
}

/// Replace components outside `[0, 100]` with a uniform draw inside the bounds.
fn redraw_out_of_bounds(rng: &mut StdRng, x: &mut [f64]) {
    for v in x.iter_mut() {
        if !(0.0..=SHARE_CAP).contains(&*v) {
            *v = rng.gen_range(0.0..=SHARE_CAP);
        }
    }
}

/// Block-wise search over the vertices of each capped simplex.
///
/// The FuelEU penalty is concave in a leg's blend, so leg optima tend to
/// sit on block vertices. Each pass tries every vertex of every block with
/// the other blocks held and keeps strict improvements only.
fn vertex_sweep(
    objective: &dyn Objective,
    start: &[f64],
    mut value: f64,
    deadline: Deadline,
) -> Result<Descent> {
    let mut x = start.to_vec();
    let mut evaluations = 0;
    let mut passes = 0;
    let mut improved = true;

    while improved && !deadline.expired() {
        improved = false;
        passes += 1;
        for block in objective.blocks() {
            if block.is_empty() {
                continue;
            }
            for vertex in 0..=block.len() {
                let mut trial = x.clone();
                for (offset, v) in trial[block.clone()].iter_mut().enumerate() {
                    *v = if offset + 1 == vertex { SHARE_CAP } else { 0.0 };
                }
                let trial_value = objective.evaluate(&trial)?;
                evaluations += 1;
                if trial_value < value {
                    x = trial;
                    value = trial_value;
                    improved = true;
                }
            }
        }
    }

    Ok(Descent {
        x,
        value,
        iterations: passes,
        evaluations,
        converged: !improved,
    })
}

fn evaluate_all(objective: &dyn Objective, points: &[Vec<f64>], parallel: bool) -> Result<Vec<f64>> {
    if parallel {
        points
            .par_iter()
            .map(|x| objective.evaluate(x))
            .collect()
    } else {
        points.iter().map(|x| objective.evaluate(x)).collect()
    }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn mean_and_spread(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
