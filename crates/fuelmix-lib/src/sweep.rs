//! Batch optimisation over a grid of compliance years and CO2 prices.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::optimizer::{OptimizationStatus, OptimizedVoyage};
use crate::regulatory::RegulatoryData;
use crate::scenario::Scenario;

/// Golden-ratio increment used to spread per-cell seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Years × CO2 prices to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub years: Vec<u16>,
    pub co2_prices: Vec<f64>,
}

impl Default for SweepGrid {
    /// 2025 to 2050 in steps of five years, CO2 prices 90 to 190 in steps of 20.
    fn default() -> Self {
        Self {
            years: (2025..=2050).step_by(5).collect(),
            co2_prices: (0..6).map(|i| 90.0 + 20.0 * i as f64).collect(),
        }
    }
}

impl SweepGrid {
    pub fn new(years: Vec<u16>, co2_prices: Vec<f64>) -> Self {
        Self { years, co2_prices }
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() || self.co2_prices.is_empty() {
            return Err(Error::invalid_scenario(
                "sweep grid needs at least one year and one CO2 price",
            ));
        }
        Ok(())
    }

    /// Grid cells in row-major order (year outer, price inner).
    pub fn cells(&self) -> Vec<(u16, f64)> {
        self.years
            .iter()
            .flat_map(|&year| self.co2_prices.iter().map(move |&price| (year, price)))
            .collect()
    }
}

/// Outcome of one grid cell; figures are absent when the cell failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub year: u16,
    pub co2_price: f64,
    pub status: Option<OptimizationStatus>,
    pub total_cost: Option<f64>,
    pub fuel_cost: Option<f64>,
    pub ets_penalty: Option<f64>,
    pub fueleu_penalty: Option<f64>,
    /// Tonnes of CO2 requiring ETS allowances.
    pub ets_allowances: Option<f64>,
    pub compliance_balance: Option<f64>,
    pub ops_cost: Option<f64>,
    pub ops_penalty: Option<f64>,
    pub error: Option<String>,
}

impl SweepRecord {
    fn success(year: u16, co2_price: f64, result: &OptimizedVoyage) -> Self {
        let totals = &result.breakdown.totals;
        Self {
            year,
            co2_price,
            status: Some(result.status),
            total_cost: Some(totals.total_cost),
            fuel_cost: Some(totals.fuel_cost.average),
            ets_penalty: Some(totals.ets_penalty),
            fueleu_penalty: Some(totals.fueleu_penalty),
            ets_allowances: Some(totals.ets_emissions_t),
            compliance_balance: Some(totals.compliance_balance),
            ops_cost: Some(totals.ops_cost),
            ops_penalty: Some(totals.ops_penalty),
            error: None,
        }
    }

    fn failure(year: u16, co2_price: f64, error: &Error) -> Self {
        Self {
            year,
            co2_price,
            status: None,
            total_cost: None,
            fuel_cost: None,
            ets_penalty: None,
            fueleu_penalty: None,
            ets_allowances: None,
            compliance_balance: None,
            ops_cost: None,
            ops_penalty: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Seed for grid cell `index`, derived from the scenario's base seed.
pub fn derive_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64 + 1).wrapping_mul(SEED_STRIDE))
}

/// Optimise `scenario` for every cell of `grid`.
///
/// Cells run in parallel and independently; a failing cell is recorded with
/// its error and does not affect the others. Records keep the grid order.
pub fn run_sweep(
    data: &RegulatoryData,
    scenario: &Scenario,
    grid: &SweepGrid,
) -> Result<Vec<SweepRecord>> {
    grid.validate()?;
    let cells = grid.cells();
    info!(cells = cells.len(), "starting scenario sweep");

    let records: Vec<SweepRecord> = cells
        .par_iter()
        .enumerate()
        .map(|(index, &(year, co2_price))| {
            let mut cell = scenario.with_market(year, co2_price);
            if let Some(base) = scenario.optimizer.seed {
                cell.optimizer.seed = Some(derive_seed(base, index));
            }
            match cell.optimize(data) {
                Ok(result) => SweepRecord::success(year, co2_price, &result),
                Err(error) => {
                    warn!(year, co2_price, %error, "sweep cell failed");
                    SweepRecord::failure(year, co2_price, &error)
                }
            }
        })
        .collect();

    let failed = records.iter().filter(|r| !r.is_success()).count();
    info!(cells = records.len(), failed, "scenario sweep complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_matches_batch_layout() {
        let grid = SweepGrid::default();
        assert_eq!(grid.years, vec![2025, 2030, 2035, 2040, 2045, 2050]);
        assert_eq!(grid.co2_prices, vec![90.0, 110.0, 130.0, 150.0, 170.0, 190.0]);
        assert_eq!(grid.cells().len(), 36);
    }

    #[test]
    fn cells_are_year_major() {
        let grid = SweepGrid::new(vec![2030, 2035], vec![1.0, 2.0]);
        assert_eq!(
            grid.cells(),
            vec![(2030, 1.0), (2030, 2.0), (2035, 1.0), (2035, 2.0)]
        );
    }

    #[test]
    fn derived_seeds_differ_per_cell() {
        assert_ne!(derive_seed(7, 0), derive_seed(7, 1));
        assert_eq!(derive_seed(7, 3), derive_seed(7, 3));
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(SweepGrid::new(Vec::new(), vec![1.0]).validate().is_err());
    }
}
