use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Fuel purchase cost range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelCost {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl Add for FuelCost {
    type Output = FuelCost;

    fn add(self, rhs: FuelCost) -> FuelCost {
        FuelCost {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
            average: self.average + rhs.average,
        }
    }
}

impl AddAssign for FuelCost {
    fn add_assign(&mut self, rhs: FuelCost) {
        *self = *self + rhs;
    }
}

/// Cost and compliance figures for a leg or a whole voyage.
///
/// Emissions and energy are reported both in full and in regulatory scope
/// (inter-EU legs count half).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fuel_cost: FuelCost,
    /// Tonnes of CO2 emitted.
    pub co2_emissions_t: f64,
    /// Tonnes of CO2 subject to ETS allowances.
    pub ets_emissions_t: f64,
    pub ets_penalty: f64,
    /// Energy consumed in MJ.
    pub energy_mj: f64,
    /// Energy within FuelEU scope in MJ.
    pub scoped_energy_mj: f64,
    pub ghg_intensity_actual: f64,
    pub ghg_intensity_target: f64,
    pub compliance_balance: f64,
    pub fueleu_penalty: f64,
    pub ops_cost: f64,
    pub ops_penalty: f64,
    pub total_cost: f64,
}

impl CostBreakdown {
    /// Sum of average fuel cost, regulatory penalties and shore-power terms.
    pub fn cost_sum(&self) -> f64 {
        self.fuel_cost.average
            + self.ets_penalty
            + self.fueleu_penalty
            + self.ops_cost
            + self.ops_penalty
    }

    /// Recompute `total_cost` from its components.
    pub fn with_total(mut self) -> Self {
        self.total_cost = self.cost_sum();
        self
    }
}
