//! Scenario files: parameters, legs and optimizer settings in one JSON document.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blend::FuelBlend;
use crate::error::{Error, Result};
use crate::leg::{ScenarioParams, TripLeg};
use crate::optimizer::{optimize_voyage, OptimizedVoyage, OptimizerConfig};
use crate::regulatory::RegulatoryData;
use crate::voyage::{evaluate_voyage, VoyageBreakdown};

/// A leg as written in a scenario file, optionally with a blend to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSpec {
    #[serde(flatten)]
    pub leg: TripLeg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend: Option<FuelBlend>,
}

impl From<TripLeg> for LegSpec {
    fn from(leg: TripLeg) -> Self {
        Self { leg, blend: None }
    }
}

/// One voyage under one set of regulatory parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub params: ScenarioParams,
    pub legs: Vec<LegSpec>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl Scenario {
    pub fn new(params: ScenarioParams, legs: impl IntoIterator<Item = TripLeg>) -> Self {
        Self {
            params,
            legs: legs.into_iter().map(LegSpec::from).collect(),
            optimizer: OptimizerConfig::default(),
        }
    }

    /// Read and validate a scenario file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut scenario: Scenario = serde_json::from_str(json)?;
        for spec in &mut scenario.legs {
            if spec.leg.label.is_empty() {
                spec.leg.label = spec.leg.kind.as_str().to_string();
            }
        }
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        self.optimizer.validate()?;
        if self.legs.is_empty() {
            return Err(Error::invalid_scenario("scenario has no legs"));
        }
        for spec in &self.legs {
            spec.leg.validate()?;
        }
        Ok(())
    }

    pub fn trip_legs(&self) -> Vec<TripLeg> {
        self.legs.iter().map(|spec| spec.leg.clone()).collect()
    }

    /// Copy of the scenario with a different compliance year and CO2 price.
    pub fn with_market(&self, year: u16, co2_price: f64) -> Self {
        let mut scenario = self.clone();
        scenario.params.year = year;
        scenario.params.co2_price = co2_price;
        scenario
    }

    /// Evaluate the blends given in the file without optimising.
    ///
    /// Every leg that burns fuel needs a blend; legs on shore power take none.
    pub fn evaluate(&self, data: &RegulatoryData) -> Result<VoyageBreakdown> {
        let mut pairs = Vec::with_capacity(self.legs.len());
        for spec in &self.legs {
            let blend = match (&spec.blend, spec.leg.uses_ops()) {
                (Some(blend), _) => blend.clone(),
                (None, true) => FuelBlend::new(),
                (None, false) => {
                    return Err(Error::invalid_scenario(format!(
                        "leg {} has no blend to evaluate",
                        spec.leg.name()
                    )))
                }
            };
            pairs.push((spec.leg.clone(), blend));
        }
        evaluate_voyage(data, &pairs, &self.params, self.optimizer.aggregation)
    }

    /// Run the configured optimizer over every leg.
    pub fn optimize(&self, data: &RegulatoryData) -> Result<OptimizedVoyage> {
        optimize_voyage(data, &self.trip_legs(), &self.params, &self.optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::TripKind;
    use crate::optimizer::SolverStrategy;

    const SCENARIO: &str = r#"{
        "year": 2025,
        "co2_price": 90,
        "legs": [
            {"kind": "intra-eu", "energy_mj": 1e6, "fixed_tonnes": 5, "candidates": ["vlsfo"],
             "blend": {"MDO": 23.4}},
            {"kind": "berth", "energy_mj": 2e5,
             "ops": {"in_use": true, "established_power_demand_mw": 2, "hours_at_berth": 8}}
        ],
        "optimizer": {"strategy": "projected-gradient"}
    }"#;

    #[test]
    fn parses_with_defaults() {
        let scenario = Scenario::from_json_str(SCENARIO).unwrap();
        assert_eq!(scenario.params.wind_factor, 1.0);
        assert_eq!(scenario.params.cost_per_mwh, 0.0);
        assert_eq!(scenario.legs[0].leg.label, "intra-eu");
        assert_eq!(scenario.legs[0].leg.fixed_fuel, "MDO");
        assert_eq!(scenario.legs[1].leg.kind, TripKind::Berth);
        assert!(scenario.legs[1].leg.uses_ops());
        assert_eq!(scenario.optimizer.strategy, SolverStrategy::ProjectedGradient);
        assert_eq!(scenario.optimizer.max_iterations, 1000);
    }

    #[test]
    fn with_market_changes_only_year_and_price() {
        let scenario = Scenario::from_json_str(SCENARIO).unwrap();
        let moved = scenario.with_market(2040, 150.0);
        assert_eq!(moved.params.year, 2040);
        assert_eq!(moved.params.co2_price, 150.0);
        assert_eq!(moved.legs, scenario.legs);
    }

    #[test]
    fn rejects_scenario_without_legs() {
        let err = Scenario::from_json_str(r#"{"year": 2030, "co2_price": 1, "legs": []}"#)
            .unwrap_err();
        assert!(err.to_string().contains("no legs"));
    }

    #[test]
    fn rejects_unknown_trip_kind() {
        let json = r#"{"year": 2030, "co2_price": 1, "legs": [{"kind": "coastal", "energy_mj": 1}]}"#;
        assert!(matches!(Scenario::from_json_str(json), Err(Error::Json(_))));
    }
}
