//! Fuel blends expressed as tonnages per fuel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::regulatory::{canonical_code, RegulatoryData};

/// Tonnage of each fuel burnt on one leg, keyed by canonical fuel code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FuelBlend {
    tonnes: BTreeMap<String, f64>,
}

impl FuelBlend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a blend from `(fuel, tonnes)` pairs; repeated fuels are summed.
    pub fn from_tonnages<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut blend = Self::new();
        for (code, tonnes) in entries {
            blend.add(code.as_ref(), tonnes)?;
        }
        Ok(blend)
    }

    /// Add `tonnes` of `code` to the blend.
    pub fn add(&mut self, code: &str, tonnes: f64) -> Result<()> {
        if !tonnes.is_finite() || tonnes < 0.0 {
            return Err(Error::invalid_scenario(format!(
                "tonnage for {} must be a finite non-negative number, got {tonnes}",
                canonical_code(code)
            )));
        }
        *self.tonnes.entry(canonical_code(code)).or_insert(0.0) += tonnes;
        Ok(())
    }

    /// Tonnes of `code` in the blend (zero when absent).
    pub fn tonnes(&self, code: &str) -> f64 {
        self.tonnes.get(&canonical_code(code)).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.tonnes.iter().map(|(code, t)| (code.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.tonnes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tonnes.is_empty()
    }

    /// Total tonnage burnt.
    pub fn total_tonnes(&self) -> f64 {
        self.tonnes.values().sum()
    }

    /// Total energy in MJ: Σ tonnes × density.
    pub fn total_energy(&self, data: &RegulatoryData) -> Result<f64> {
        let mut energy = 0.0;
        for (code, tonnes) in &self.tonnes {
            energy += tonnes * data.density(code)?;
        }
        Ok(energy)
    }

    /// Energy share of each fuel in percent; the shares sum to 100.
    pub fn energy_shares(&self, data: &RegulatoryData) -> Result<BTreeMap<String, f64>> {
        let total = self.total_energy(data)?;
        if !(total.is_finite() && total > 0.0) {
            return Err(Error::degenerate(format!(
                "blend supplies no energy (total {total} MJ)"
            )));
        }

        let mut shares = BTreeMap::new();
        for (code, tonnes) in &self.tonnes {
            shares.insert(code.clone(), tonnes * data.density(code)? / total * 100.0);
        }
        Ok(shares)
    }
}

impl TryFrom<BTreeMap<String, f64>> for FuelBlend {
    type Error = Error;

    fn try_from(value: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_tonnages(value)
    }
}

impl From<FuelBlend> for BTreeMap<String, f64> {
    fn from(value: FuelBlend) -> Self {
        value.tonnes
    }
}
