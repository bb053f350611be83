//! Voyage-level aggregation of leg results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::blend::FuelBlend;
use crate::breakdown::CostBreakdown;
use crate::error::{Error, Result};
use crate::leg::{evaluate_leg, LegResult, ScenarioParams, TripLeg};
use crate::penalty;
use crate::regulatory::RegulatoryData;

/// How FuelEU compliance is combined across legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    /// One energy-weighted intensity for the voyage, penalised once.
    #[default]
    Pooled,
    /// Sum of the per-leg penalties.
    PerLeg,
}

impl AggregationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMode::Pooled => "pooled",
            AggregationMode::PerLeg => "per-leg",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pooled" => Ok(AggregationMode::Pooled),
            "per-leg" | "per_leg" | "perleg" => Ok(AggregationMode::PerLeg),
            other => Err(Error::invalid_scenario(format!(
                "unknown aggregation mode '{other}' (expected pooled or per-leg)"
            ))),
        }
    }
}

/// Per-leg results together with the voyage totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageBreakdown {
    pub aggregation: AggregationMode,
    pub legs: Vec<LegResult>,
    pub totals: CostBreakdown,
}

/// Combine evaluated legs into voyage totals.
///
/// Fuel, ETS and OPS figures are summed. In pooled mode the FuelEU balance
/// is recomputed from the in-scope-energy-weighted intensity of all legs;
/// legs on shore power count at zero intensity.
pub fn aggregate(
    data: &RegulatoryData,
    legs: Vec<LegResult>,
    params: &ScenarioParams,
    mode: AggregationMode,
) -> Result<VoyageBreakdown> {
    if legs.is_empty() {
        return Err(Error::invalid_scenario("voyage has no legs"));
    }

    let mut totals = CostBreakdown {
        ghg_intensity_target: penalty::ghg_intensity_target(data, params.year),
        ..CostBreakdown::default()
    };
    let mut weighted_intensity = 0.0;
    for leg in &legs {
        let b = &leg.breakdown;
        totals.fuel_cost += b.fuel_cost;
        totals.co2_emissions_t += b.co2_emissions_t;
        totals.ets_emissions_t += b.ets_emissions_t;
        totals.ets_penalty += b.ets_penalty;
        totals.energy_mj += b.energy_mj;
        totals.scoped_energy_mj += b.scoped_energy_mj;
        totals.ops_cost += b.ops_cost;
        totals.ops_penalty += b.ops_penalty;
        totals.compliance_balance += b.compliance_balance;
        totals.fueleu_penalty += b.fueleu_penalty;
        weighted_intensity += b.ghg_intensity_actual * b.scoped_energy_mj;
    }

    if !(totals.scoped_energy_mj.is_finite() && totals.scoped_energy_mj > 0.0) {
        return Err(Error::degenerate(format!(
            "voyage has no in-scope energy (total {} MJ)",
            totals.scoped_energy_mj
        )));
    }
    totals.ghg_intensity_actual = weighted_intensity / totals.scoped_energy_mj;

    if mode == AggregationMode::Pooled {
        let compliance = penalty::fueleu_penalty(
            totals.ghg_intensity_actual,
            totals.ghg_intensity_target,
            totals.scoped_energy_mj,
            params.wind_factor,
        )?;
        totals.compliance_balance = compliance.balance;
        totals.fueleu_penalty = compliance.penalty;
    }

    Ok(VoyageBreakdown {
        aggregation: mode,
        legs,
        totals: totals.with_total(),
    })
}

/// Evaluate caller-given blends for every leg and aggregate them.
pub fn evaluate_voyage(
    data: &RegulatoryData,
    legs: &[(TripLeg, FuelBlend)],
    params: &ScenarioParams,
    mode: AggregationMode,
) -> Result<VoyageBreakdown> {
    let results = legs
        .iter()
        .map(|(leg, blend)| evaluate_leg(data, leg, blend, params))
        .collect::<Result<Vec<_>>>()?;
    aggregate(data, results, params, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::{OpsConfig, TripKind};
    use crate::regulatory::{FuelProperties, PriceBounds, PriceSchedule, RegulatoryTargets};

    fn data() -> RegulatoryData {
        let priced = |fuel: FuelProperties, min: f64, max: f64| {
            fuel.with_prices(PriceSchedule::generic(PriceBounds::new(min, max)))
        };
        RegulatoryData::new(
            [
                priced(FuelProperties::new("MDO", 42_700.0, 90.77, 3.206), 700.0, 800.0),
                priced(FuelProperties::new("BIO-DIESEL", 37_200.0, 20.8, 2.834), 1_200.0, 1_500.0),
            ],
            RegulatoryTargets::new(91.16).with_reduction(2030, 6.0),
        )
        .unwrap()
    }

    fn params() -> ScenarioParams {
        ScenarioParams::new(2030, 100.0)
    }

    /// A dirty MDO leg and a clean bio leg whose surplus offsets the deficit.
    fn legs(data: &RegulatoryData) -> Vec<(TripLeg, FuelBlend)> {
        let dirty = TripLeg::new(TripKind::IntraEu, 4.27e6).with_label("dirty");
        let clean = TripLeg::new(TripKind::IntraEu, 3.72e6)
            .with_label("clean")
            .with_fixed("MDO", 0.0);
        let dirty_blend = FuelBlend::from_tonnages([("MDO", 100.0)]).unwrap();
        let clean_blend = FuelBlend::from_tonnages([("BIO-DIESEL", 100.0)]).unwrap();
        assert!((clean_blend.total_energy(data).unwrap() - 3.72e6).abs() < 1e-6);
        vec![(dirty, dirty_blend), (clean, clean_blend)]
    }

    #[test]
    fn pooling_offsets_deficit_with_surplus() {
        let data = data();
        let legs = legs(&data);
        let pooled = evaluate_voyage(&data, &legs, &params(), AggregationMode::Pooled).unwrap();
        let per_leg = evaluate_voyage(&data, &legs, &params(), AggregationMode::PerLeg).unwrap();

        assert_eq!(pooled.totals.fueleu_penalty, 0.0);
        assert!(pooled.totals.compliance_balance > 0.0);
        assert!(per_leg.totals.fueleu_penalty > 0.0);
        assert!(per_leg.totals.total_cost > pooled.totals.total_cost);
        assert_eq!(pooled.totals.ets_penalty, per_leg.totals.ets_penalty);
    }

    #[test]
    fn pooled_intensity_is_energy_weighted() {
        let data = data();
        let pooled =
            evaluate_voyage(&data, &legs(&data), &params(), AggregationMode::Pooled).unwrap();
        let expected = (90.77 * 4.27e6 + 20.8 * 3.72e6) / (4.27e6 + 3.72e6);
        assert!((pooled.totals.ghg_intensity_actual - expected).abs() < 1e-9);
    }

    #[test]
    fn shore_power_leg_enters_pool_at_zero_intensity() {
        let data = data();
        let sea = TripLeg::new(TripKind::IntraEu, 4.27e6);
        let berth = TripLeg::new(TripKind::Berth, 4.27e6).with_ops(OpsConfig {
            in_use: true,
            total_installed_power_mw: 0.0,
            established_power_demand_mw: 2.0,
            hours_at_berth: 10.0,
        });
        let legs = vec![
            (sea, FuelBlend::from_tonnages([("MDO", 100.0)]).unwrap()),
            (berth, FuelBlend::new()),
        ];
        let pooled = evaluate_voyage(&data, &legs, &params(), AggregationMode::Pooled).unwrap();
        assert!((pooled.totals.ghg_intensity_actual - 90.77 / 2.0).abs() < 1e-9);
        assert_eq!(pooled.totals.fueleu_penalty, 0.0);
        assert_eq!(pooled.totals.ops_penalty, 30.0);
    }

    #[test]
    fn total_is_sum_of_components() {
        let data = data();
        let v = evaluate_voyage(&data, &legs(&data), &params(), AggregationMode::PerLeg).unwrap();
        let leg_sum: f64 = v.legs.iter().map(|l| l.breakdown.total_cost).sum();
        assert!((v.totals.total_cost - leg_sum).abs() < 1e-6);
    }

    #[test]
    fn aggregation_mode_parses() {
        assert_eq!("per-leg".parse::<AggregationMode>().unwrap(), AggregationMode::PerLeg);
        assert_eq!("Pooled".parse::<AggregationMode>().unwrap(), AggregationMode::Pooled);
        assert!("joint".parse::<AggregationMode>().is_err());
    }

    #[test]
    fn empty_voyage_is_rejected() {
        let err = aggregate(&data(), Vec::new(), &params(), AggregationMode::Pooled).unwrap_err();
        assert!(matches!(err, Error::InvalidScenario { .. }));
    }
}
