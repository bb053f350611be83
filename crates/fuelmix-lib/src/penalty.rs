//! EU ETS and FuelEU Maritime cost formulas.
//!
//! Every function here is pure: it reads the reference data and returns a
//! figure, so it can be called concurrently from any number of evaluations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blend::FuelBlend;
use crate::breakdown::FuelCost;
use crate::error::{Error, Result};
use crate::regulatory::RegulatoryData;

/// Year in which only part of the ETS emissions must be surrendered.
pub const ETS_PHASE_IN_YEAR: u16 = 2025;
/// Share of emissions surrendered in [`ETS_PHASE_IN_YEAR`].
pub const ETS_PHASE_IN_FACTOR: f64 = 0.70;
/// Energy content of one VLSFO-equivalent tonne in MJ.
pub const VLSFO_REFERENCE_MJ_PER_T: f64 = 41_000.0;
/// FuelEU penalty per VLSFO-equivalent tonne of compliance deficit.
pub const PENALTY_PER_VLSFO_T: f64 = 2_400.0;
/// MJ to MWh conversion.
pub const MJ_TO_MWH: f64 = 0.0002777778;
/// OPS penalty per MW of established power demand and hour at berth.
pub const OPS_PENALTY_RATE: f64 = 1.5;

/// FuelEU compliance balance and the resulting penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Compliance {
    /// Signed balance in gCO2e; negative means a deficit.
    pub balance: f64,
    pub penalty: f64,
}

/// Purchase cost of a blend in `year`.
pub fn fuel_cost(data: &RegulatoryData, blend: &FuelBlend, year: u16) -> Result<FuelCost> {
    let mut cost = FuelCost::default();
    for (code, tonnes) in blend.iter() {
        let bounds = data.price_bounds(code, year)?;
        cost += FuelCost {
            min: tonnes * bounds.price_min,
            max: tonnes * bounds.price_max,
            average: tonnes * bounds.average(),
        };
    }
    Ok(cost)
}

/// Tonnes of CO2 emitted by burning `blend`.
///
/// A fuel without reference data fails the evaluation.
pub fn co2_emissions(data: &RegulatoryData, blend: &FuelBlend) -> Result<f64> {
    let mut total = 0.0;
    for (code, tonnes) in blend.iter() {
        total += tonnes * data.co2_factor(code)?;
    }
    Ok(total)
}

/// Cost of the ETS allowances for `emissions_t` tonnes of CO2.
pub fn ets_penalty(emissions_t: f64, price_per_t: f64, year: u16) -> f64 {
    let penalty = emissions_t * price_per_t;
    if year == ETS_PHASE_IN_YEAR {
        penalty * ETS_PHASE_IN_FACTOR
    } else {
        penalty
    }
}

/// Energy-weighted WtW intensity of a blend in gCO2e/MJ.
///
/// `percentages` are energy shares that must already sum to 100.
pub fn ghg_intensity_actual(
    data: &RegulatoryData,
    percentages: &BTreeMap<String, f64>,
) -> Result<f64> {
    let mut intensity = 0.0;
    for (code, share) in percentages {
        intensity += share / 100.0 * data.wtw_factor(code)?;
    }
    Ok(intensity)
}

/// Regulatory GHG-intensity limit for `year`.
pub fn ghg_intensity_target(data: &RegulatoryData, year: u16) -> f64 {
    data.targets().ghg_intensity_target(year)
}

/// FuelEU compliance balance and penalty.
///
/// `CB = wind_factor × (target − actual) × energy`. A deficit is converted
/// into VLSFO-equivalent tonnes at the actual intensity and priced per tonne.
pub fn fueleu_penalty(
    actual: f64,
    target: f64,
    energy_mj: f64,
    wind_factor: f64,
) -> Result<Compliance> {
    let balance = wind_factor * (target - actual) * energy_mj;
    if !balance.is_finite() {
        return Err(Error::degenerate(format!(
            "compliance balance is not finite (actual {actual}, target {target}, energy {energy_mj})"
        )));
    }
    if balance >= 0.0 {
        return Ok(Compliance {
            balance,
            penalty: 0.0,
        });
    }
    if actual <= 0.0 {
        return Err(Error::degenerate(format!(
            "deficit with non-positive actual intensity {actual}"
        )));
    }

    let penalty = balance.abs() / (actual * VLSFO_REFERENCE_MJ_PER_T) * PENALTY_PER_VLSFO_T;
    Ok(Compliance { balance, penalty })
}

/// Cost of drawing `energy_mj` from shore power.
pub fn ops_cost(energy_mj: f64, cost_per_mwh: f64) -> f64 {
    energy_mj * MJ_TO_MWH * cost_per_mwh
}

/// Penalty for the established power demand while at berth.
pub fn ops_penalty(established_power_demand_mw: f64, hours_at_berth: f64) -> f64 {
    OPS_PENALTY_RATE * established_power_demand_mw * hours_at_berth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulatory::{FuelProperties, PriceBounds, PriceSchedule, RegulatoryTargets};

    fn data() -> RegulatoryData {
        RegulatoryData::new(
            [
                FuelProperties::new("MDO", 42_700.0, 90.77, 3.206)
                    .with_prices(PriceSchedule::generic(PriceBounds::new(700.0, 800.0))),
                FuelProperties::new("BIO-DIESEL", 37_200.0, 20.8, 2.834).with_prices(
                    PriceSchedule::generic(PriceBounds::new(1_200.0, 1_500.0))
                        .with_year(2030, PriceBounds::new(1_100.0, 1_300.0)),
                ),
                FuelProperties::new("LNG", 49_100.0, 80.0, 2.75),
            ],
            RegulatoryTargets::new(91.16).with_reduction(2030, 6.0),
        )
        .unwrap()
    }

    #[test]
    fn fuel_cost_prefers_year_prices() {
        let blend = FuelBlend::from_tonnages([("MDO", 2.0), ("BIO-DIESEL", 1.0)]).unwrap();
        let cost = fuel_cost(&data(), &blend, 2030).unwrap();
        assert_eq!(cost.min, 2_500.0);
        assert_eq!(cost.max, 2_900.0);
        assert_eq!(cost.average, 2_700.0);
    }

    #[test]
    fn fuel_cost_fails_for_fuel_without_prices() {
        let blend = FuelBlend::from_tonnages([("LNG", 1.0)]).unwrap();
        let err = fuel_cost(&data(), &blend, 2030).unwrap_err();
        assert!(matches!(err, Error::UnknownFuel { .. }));
    }

    #[test]
    fn co2_emissions_fail_loudly_for_unknown_fuel() {
        let blend = FuelBlend::from_tonnages([("MDO", 1.0), ("AMMONIA", 1.0)]).unwrap();
        let err = co2_emissions(&data(), &blend).unwrap_err();
        assert!(matches!(err, Error::UnknownFuel { code, .. } if code == "AMMONIA"));
    }

    #[test]
    fn ets_phase_in_applies_only_in_2025() {
        let full = ets_penalty(1_000.0, 90.0, 2024);
        assert_eq!(full, 90_000.0);
        assert!((ets_penalty(1_000.0, 90.0, 2025) - 0.70 * full).abs() < 1e-9);
        assert_eq!(ets_penalty(1_000.0, 90.0, 2026), full);
    }

    #[test]
    fn intensity_is_a_convex_combination() {
        let mut shares = BTreeMap::new();
        shares.insert("MDO".to_string(), 25.0);
        shares.insert("BIO-DIESEL".to_string(), 75.0);
        let actual = ghg_intensity_actual(&data(), &shares).unwrap();
        assert!((actual - (0.25 * 90.77 + 0.75 * 20.8)).abs() < 1e-9);
        assert!(actual > 20.8 && actual < 90.77);
    }

    #[test]
    fn surplus_carries_no_penalty() {
        let compliance = fueleu_penalty(80.0, 85.69, 1.0e6, 1.0).unwrap();
        assert!(compliance.balance > 0.0);
        assert_eq!(compliance.penalty, 0.0);
    }

    #[test]
    fn deficit_is_priced_in_vlsfo_equivalent_tonnes() {
        let compliance = fueleu_penalty(90.77, 85.6904, 1.0e6, 1.0).unwrap();
        let expected_cb = (85.6904 - 90.77) * 1.0e6;
        assert!((compliance.balance - expected_cb).abs() < 1e-6);
        let expected = expected_cb.abs() / (90.77 * 41_000.0) * 2_400.0;
        assert!((compliance.penalty - expected).abs() < 1e-9);
    }

    #[test]
    fn penalty_vanishes_continuously_at_the_boundary() {
        let target = 85.0;
        let mut previous = f64::INFINITY;
        for gap in [1.0, 1e-2, 1e-4, 1e-6, 1e-9] {
            let penalty = fueleu_penalty(target + gap, target, 1.0e6, 1.0)
                .unwrap()
                .penalty;
            assert!(penalty > 0.0);
            assert!(penalty < previous);
            previous = penalty;
        }
        assert!(previous < 1e-3);
        assert_eq!(fueleu_penalty(target, target, 1.0e6, 1.0).unwrap().penalty, 0.0);
    }

    #[test]
    fn wind_factor_scales_the_balance() {
        let plain = fueleu_penalty(90.0, 85.0, 1.0e6, 1.0).unwrap();
        let assisted = fueleu_penalty(90.0, 85.0, 1.0e6, 0.95).unwrap();
        assert!((assisted.balance - 0.95 * plain.balance).abs() < 1e-6);
        assert!(assisted.penalty < plain.penalty);
    }

    #[test]
    fn non_finite_balance_is_degenerate() {
        let err = fueleu_penalty(f64::NAN, 85.0, 1.0e6, 1.0).unwrap_err();
        assert!(matches!(err, Error::DegenerateBlend { .. }));
    }

    #[test]
    fn ops_formulas() {
        assert!((ops_cost(3.6e6, 100.0) - 100_000.0).abs() < 1.0);
        assert_eq!(ops_penalty(4.0, 24.0), 144.0);
    }
}
