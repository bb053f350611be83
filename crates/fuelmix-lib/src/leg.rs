//! Voyage legs and their per-leg cost evaluation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::blend::FuelBlend;
use crate::breakdown::CostBreakdown;
use crate::error::{Error, Result};
use crate::penalty;
use crate::regulatory::{canonical_code, RegulatoryData};

/// Fuel burnt first on every leg unless the scenario says otherwise.
pub const DEFAULT_FIXED_FUEL: &str = "MDO";

/// Share of an inter-EU voyage that falls within EU regulatory scope.
pub const INTER_EU_SCOPE: f64 = 0.5;

/// Relative energy deviation tolerated before a given blend is reported.
pub const DEFAULT_ENERGY_TOLERANCE: f64 = 1e-3;

/// Regulatory classification of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripKind {
    IntraEu,
    InterEu,
    Berth,
}

impl TripKind {
    /// Fraction of emissions and energy counted by ETS and FuelEU.
    pub fn scope_factor(self) -> f64 {
        match self {
            TripKind::InterEu => INTER_EU_SCOPE,
            TripKind::IntraEu | TripKind::Berth => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripKind::IntraEu => "intra-eu",
            TripKind::InterEu => "inter-eu",
            TripKind::Berth => "berth",
        }
    }
}

impl fmt::Display for TripKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onshore power supply settings for a berth leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpsConfig {
    pub in_use: bool,
    /// Accepted for completeness; the penalty depends on demand only.
    #[serde(default)]
    pub total_installed_power_mw: f64,
    pub established_power_demand_mw: f64,
    pub hours_at_berth: f64,
}

impl OpsConfig {
    fn validate(&self, leg: &str) -> Result<()> {
        let fields = [
            (self.total_installed_power_mw, "total_installed_power_mw"),
            (self.established_power_demand_mw, "established_power_demand_mw"),
            (self.hours_at_berth, "hours_at_berth"),
        ];
        for (value, field) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_scenario(format!(
                    "{field} on leg {leg} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Scenario-wide regulatory parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub year: u16,
    /// ETS allowance price per tonne CO2.
    pub co2_price: f64,
    /// Shore power price per MWh.
    #[serde(default)]
    pub cost_per_mwh: f64,
    /// Wind-assistance factor in [0.95, 1.0]; 1.0 means no credit.
    #[serde(default = "default_wind_factor")]
    pub wind_factor: f64,
}

fn default_wind_factor() -> f64 {
    1.0
}

impl ScenarioParams {
    pub fn new(year: u16, co2_price: f64) -> Self {
        Self {
            year,
            co2_price,
            cost_per_mwh: 0.0,
            wind_factor: default_wind_factor(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.co2_price.is_finite() || self.co2_price < 0.0 {
            return Err(Error::invalid_scenario(format!(
                "co2_price must be a finite non-negative number, got {}",
                self.co2_price
            )));
        }
        if !self.cost_per_mwh.is_finite() || self.cost_per_mwh < 0.0 {
            return Err(Error::invalid_scenario(format!(
                "cost_per_mwh must be a finite non-negative number, got {}",
                self.cost_per_mwh
            )));
        }
        if !(0.95..=1.0).contains(&self.wind_factor) {
            return Err(Error::invalid_scenario(format!(
                "wind_factor must be within [0.95, 1.0], got {}",
                self.wind_factor
            )));
        }
        Ok(())
    }
}

/// One leg of a voyage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLeg {
    #[serde(default)]
    pub label: String,
    pub kind: TripKind,
    /// Required energy in MJ.
    pub energy_mj: f64,
    #[serde(default = "default_fixed_fuel")]
    pub fixed_fuel: String,
    /// Tonnes of the fixed fuel burnt before any candidate.
    #[serde(default)]
    pub fixed_tonnes: f64,
    /// Fuels whose share is optimised.
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<OpsConfig>,
}

fn default_fixed_fuel() -> String {
    DEFAULT_FIXED_FUEL.to_string()
}

impl TripLeg {
    pub fn new(kind: TripKind, energy_mj: f64) -> Self {
        Self {
            label: kind.as_str().to_string(),
            kind,
            energy_mj,
            fixed_fuel: default_fixed_fuel(),
            fixed_tonnes: 0.0,
            candidates: Vec::new(),
            ops: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_fixed(mut self, fuel: impl Into<String>, tonnes: f64) -> Self {
        self.fixed_fuel = fuel.into();
        self.fixed_tonnes = tonnes;
        self
    }

    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ops(mut self, ops: OpsConfig) -> Self {
        self.ops = Some(ops);
        self
    }

    /// Label used in messages; falls back to the leg kind.
    pub fn name(&self) -> &str {
        if self.label.is_empty() {
            self.kind.as_str()
        } else {
            &self.label
        }
    }

    /// Whether the leg draws shore power instead of burning fuel.
    pub fn uses_ops(&self) -> bool {
        self.kind == TripKind::Berth && self.ops.is_some_and(|ops| ops.in_use)
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        if !self.energy_mj.is_finite() || self.energy_mj <= 0.0 {
            return Err(Error::invalid_scenario(format!(
                "energy_mj on leg {name} must be a finite positive number, got {}",
                self.energy_mj
            )));
        }
        if !self.fixed_tonnes.is_finite() || self.fixed_tonnes < 0.0 {
            return Err(Error::invalid_scenario(format!(
                "fixed_tonnes on leg {name} must be a finite non-negative number, got {}",
                self.fixed_tonnes
            )));
        }
        if canonical_code(&self.fixed_fuel).is_empty() {
            return Err(Error::invalid_scenario(format!(
                "leg {name} needs a fixed fuel"
            )));
        }
        match (self.kind, &self.ops) {
            (TripKind::Berth, Some(ops)) => ops.validate(name)?,
            (TripKind::Berth, None) => {}
            (_, Some(_)) => {
                return Err(Error::invalid_scenario(format!(
                    "leg {name} is not a berth leg and cannot use shore power"
                )))
            }
            (_, None) => {}
        }
        if self.kind == TripKind::Berth && !self.candidates.is_empty() {
            return Err(Error::invalid_scenario(format!(
                "berth leg {name} burns only its fixed fuel and takes no candidates"
            )));
        }
        Ok(())
    }

    /// Canonical candidate codes, deduplicated, with the fixed fuel removed.
    pub fn effective_candidates(&self) -> Vec<String> {
        let fixed = canonical_code(&self.fixed_fuel);
        let mut out: Vec<String> = Vec::with_capacity(self.candidates.len());
        for raw in &self.candidates {
            let code = canonical_code(raw);
            if code == fixed {
                warn!(
                    leg = self.name(),
                    fuel = %code,
                    "candidate duplicates the fixed fuel and is ignored"
                );
                continue;
            }
            if !out.contains(&code) {
                out.push(code);
            }
        }
        out
    }

    /// Resolve densities and the residual energy left after the fixed fuel.
    ///
    /// Fails with [`Error::InfeasibleRegion`] when the fixed fuel alone
    /// exceeds the leg's demand.
    pub fn decoder(&self, data: &RegulatoryData) -> Result<BlendDecoder> {
        let fixed_fuel = canonical_code(&self.fixed_fuel);
        let fixed_density = data.density(&fixed_fuel)?;
        let candidates = self.effective_candidates();
        let candidate_densities = candidates
            .iter()
            .map(|code| data.density(code))
            .collect::<Result<Vec<_>>>()?;

        let fixed_energy = self.fixed_tonnes * fixed_density;
        let residual_mj = self.energy_mj - fixed_energy;
        if residual_mj < 0.0 {
            return Err(Error::InfeasibleRegion {
                leg: self.name().to_string(),
                fixed_energy_mj: fixed_energy,
                required_energy_mj: self.energy_mj,
            });
        }

        Ok(BlendDecoder {
            leg: self.name().to_string(),
            energy_mj: self.energy_mj,
            fixed_fuel,
            fixed_tonnes: self.fixed_tonnes,
            fixed_density,
            candidates,
            candidate_densities,
            residual_mj,
        })
    }
}

/// Maps candidate percentages to tonnages for one leg.
///
/// The fixed tonnage is burnt first; the residual energy is split between
/// the candidates by their percentages and the fixed fuel takes the rest.
#[derive(Debug, Clone)]
pub struct BlendDecoder {
    leg: String,
    energy_mj: f64,
    fixed_fuel: String,
    fixed_tonnes: f64,
    fixed_density: f64,
    candidates: Vec<String>,
    candidate_densities: Vec<f64>,
    residual_mj: f64,
}

/// Slack allowed on the percentage bounds before a point is rejected.
const SHARE_SLACK: f64 = 1e-9;

impl BlendDecoder {
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn fixed_fuel(&self) -> &str {
        &self.fixed_fuel
    }

    /// Energy left after the fixed tonnage, in MJ.
    pub fn residual_mj(&self) -> f64 {
        self.residual_mj
    }

    /// Number of decision variables for this leg.
    pub fn dimension(&self) -> usize {
        self.candidates.len()
    }

    /// Tonnages for candidate percentages `shares` (one per candidate).
    pub fn decode(&self, shares: &[f64]) -> Result<FuelBlend> {
        if shares.len() != self.candidates.len() {
            return Err(Error::invalid_scenario(format!(
                "leg {} expects {} shares, got {}",
                self.leg,
                self.candidates.len(),
                shares.len()
            )));
        }

        let mut blend = FuelBlend::new();
        let mut used = 0.0;
        for ((code, density), share) in self
            .candidates
            .iter()
            .zip(&self.candidate_densities)
            .zip(shares)
        {
            if !share.is_finite() || *share < -SHARE_SLACK || *share > 100.0 + SHARE_SLACK {
                return Err(Error::invalid_scenario(format!(
                    "share of {code} on leg {} must lie within [0, 100], got {share}",
                    self.leg
                )));
            }
            let share = share.clamp(0.0, 100.0);
            used += share;
            blend.add(code, share / 100.0 * self.residual_mj / density)?;
        }

        if used > 100.0 + SHARE_SLACK * shares.len().max(1) as f64 {
            return Err(Error::invalid_scenario(format!(
                "candidate shares on leg {} sum to {used}, above 100",
                self.leg
            )));
        }

        let slack = (100.0 - used).max(0.0);
        blend.add(
            &self.fixed_fuel,
            self.fixed_tonnes + slack / 100.0 * self.residual_mj / self.fixed_density,
        )?;
        Ok(blend)
    }

    /// Check that a blend reproduces the leg's energy within `tolerance` (relative).
    pub fn check_energy(&self, data: &RegulatoryData, blend: &FuelBlend, tolerance: f64) -> Result<()> {
        check_energy(&self.leg, self.energy_mj, data, blend, tolerance)
    }
}

fn check_energy(
    leg: &str,
    expected_mj: f64,
    data: &RegulatoryData,
    blend: &FuelBlend,
    tolerance: f64,
) -> Result<()> {
    let actual_mj = blend.total_energy(data)?;
    if (actual_mj - expected_mj).abs() > tolerance * expected_mj {
        return Err(Error::EnergyImbalance {
            leg: leg.to_string(),
            expected_mj,
            actual_mj,
        });
    }
    Ok(())
}

/// A leg evaluated against one blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    pub label: String,
    pub kind: TripKind,
    pub blend: FuelBlend,
    /// Energy share of each fuel in percent.
    pub percentages: BTreeMap<String, f64>,
    pub breakdown: CostBreakdown,
}

/// Evaluate `blend` on `leg`.
///
/// Berth legs on shore power take an empty blend. A blend whose energy
/// deviates from the leg demand is still scored, with a warning.
pub fn evaluate_leg(
    data: &RegulatoryData,
    leg: &TripLeg,
    blend: &FuelBlend,
    params: &ScenarioParams,
) -> Result<LegResult> {
    leg.validate()?;
    params.validate()?;

    if !leg.uses_ops() {
        if let Err(Error::EnergyImbalance {
            expected_mj,
            actual_mj,
            ..
        }) = check_energy(leg.name(), leg.energy_mj, data, blend, DEFAULT_ENERGY_TOLERANCE)
        {
            warn!(
                leg = leg.name(),
                expected_mj, actual_mj, "blend energy deviates from leg demand"
            );
        }
    }

    score_leg(data, leg, blend, params)
}

/// Score a blend without validating the leg or the parameters.
pub(crate) fn score_leg(
    data: &RegulatoryData,
    leg: &TripLeg,
    blend: &FuelBlend,
    params: &ScenarioParams,
) -> Result<LegResult> {
    let target = penalty::ghg_intensity_target(data, params.year);

    if leg.uses_ops() {
        if blend.total_tonnes() > 0.0 {
            return Err(Error::invalid_scenario(format!(
                "berth leg {} is on shore power and burns no fuel",
                leg.name()
            )));
        }
        let (demand_mw, hours) = leg
            .ops
            .map(|ops| (ops.established_power_demand_mw, ops.hours_at_berth))
            .unwrap_or((0.0, 0.0));
        let compliance = penalty::fueleu_penalty(0.0, target, leg.energy_mj, params.wind_factor)?;
        let breakdown = CostBreakdown {
            energy_mj: leg.energy_mj,
            scoped_energy_mj: leg.energy_mj,
            ghg_intensity_target: target,
            compliance_balance: compliance.balance,
            ops_cost: penalty::ops_cost(leg.energy_mj, params.cost_per_mwh),
            ops_penalty: penalty::ops_penalty(demand_mw, hours),
            ..CostBreakdown::default()
        }
        .with_total();
        return Ok(LegResult {
            label: leg.name().to_string(),
            kind: leg.kind,
            blend: FuelBlend::new(),
            percentages: BTreeMap::new(),
            breakdown,
        });
    }

    let scope = leg.kind.scope_factor();
    let percentages = blend.energy_shares(data)?;
    let actual = penalty::ghg_intensity_actual(data, &percentages)?;
    let co2 = penalty::co2_emissions(data, blend)?;
    let ets_emissions = co2 * scope;
    let scoped_energy = leg.energy_mj * scope;
    let compliance = penalty::fueleu_penalty(actual, target, scoped_energy, params.wind_factor)?;

    let breakdown = CostBreakdown {
        fuel_cost: penalty::fuel_cost(data, blend, params.year)?,
        co2_emissions_t: co2,
        ets_emissions_t: ets_emissions,
        ets_penalty: penalty::ets_penalty(ets_emissions, params.co2_price, params.year),
        energy_mj: leg.energy_mj,
        scoped_energy_mj: scoped_energy,
        ghg_intensity_actual: actual,
        ghg_intensity_target: target,
        compliance_balance: compliance.balance,
        fueleu_penalty: compliance.penalty,
        ops_cost: 0.0,
        ops_penalty: 0.0,
        total_cost: 0.0,
    }
    .with_total();

    Ok(LegResult {
        label: leg.name().to_string(),
        kind: leg.kind,
        blend: blend.clone(),
        percentages,
        breakdown,
    })
}
