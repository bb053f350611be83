//! Read-only lookup surface over the loaded reference tables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::fuel::{canonical_code, FuelProperties, PriceBounds};
use super::targets::RegulatoryTargets;

/// Minimum Jaro-Winkler similarity for a fuel code to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Immutable reference data shared by every evaluation of a scenario.
///
/// Built once and passed by reference; it is `Send + Sync` so parallel
/// scenario runs can share one instance without locking.
#[derive(Debug, Clone)]
pub struct RegulatoryData {
    fuels: BTreeMap<String, FuelProperties>,
    targets: RegulatoryTargets,
    source: Option<PathBuf>,
}

impl RegulatoryData {
    /// Build a store from fuel definitions and the GHG target schedule.
    pub fn new(
        fuels: impl IntoIterator<Item = FuelProperties>,
        targets: RegulatoryTargets,
    ) -> Result<Self> {
        targets.validate()?;

        let mut table = BTreeMap::new();
        for mut fuel in fuels {
            fuel.code = canonical_code(&fuel.code);
            fuel.validate()?;
            if table.contains_key(&fuel.code) {
                return Err(Error::DuplicateFuel { code: fuel.code });
            }
            table.insert(fuel.code.clone(), fuel);
        }

        if table.is_empty() {
            return Err(Error::RegulatoryDataValidation {
                message: "fuel table is empty".to_string(),
            });
        }

        Ok(Self {
            fuels: table,
            targets,
            source: None,
        })
    }

    pub(crate) fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    /// Look up a fuel by code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<&FuelProperties> {
        self.fuels.get(&canonical_code(code))
    }

    /// Look up a fuel, failing with suggestions when it is unknown.
    pub fn fuel(&self, code: &str) -> Result<&FuelProperties> {
        self.get(code).ok_or_else(|| Error::UnknownFuel {
            code: canonical_code(code),
            suggestions: self.fuzzy_fuel_matches(code, 3),
        })
    }

    /// Energy density in MJ per tonne.
    pub fn density(&self, code: &str) -> Result<f64> {
        Ok(self.fuel(code)?.density_mj_per_t)
    }

    /// Well-to-wake intensity in gCO2e per MJ.
    pub fn wtw_factor(&self, code: &str) -> Result<f64> {
        Ok(self.fuel(code)?.wtw_gco2e_per_mj)
    }

    /// CO2 emission factor in tonnes CO2 per tonne fuel.
    pub fn co2_factor(&self, code: &str) -> Result<f64> {
        Ok(self.fuel(code)?.co2_t_per_t)
    }

    /// Price bounds for `code` in `year`, falling back to the generic bounds.
    ///
    /// A fuel without any price entry is reported as unknown; a price entry
    /// holding neither the year nor generic bounds is reported as missing data.
    pub fn price_bounds(&self, code: &str, year: u16) -> Result<PriceBounds> {
        let fuel = self.fuel(code)?;
        let Some(schedule) = &fuel.prices else {
            return Err(Error::UnknownFuel {
                code: fuel.code.clone(),
                suggestions: Vec::new(),
            });
        };
        schedule.bounds_for(year).ok_or_else(|| Error::NoPriceData {
            fuel: fuel.code.clone(),
            year,
        })
    }

    /// GHG-intensity reduction schedule.
    pub fn targets(&self) -> &RegulatoryTargets {
        &self.targets
    }

    /// Sorted list of canonical fuel codes.
    pub fn fuel_codes(&self) -> Vec<String> {
        self.fuels.keys().cloned().collect()
    }

    /// All fuels sorted by code.
    pub fn fuels_sorted(&self) -> Vec<&FuelProperties> {
        self.fuels.values().collect()
    }

    /// Directory or file the data was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Fuel codes similar to `code`, best match first.
    pub fn fuzzy_fuel_matches(&self, code: &str, limit: usize) -> Vec<String> {
        let needle = canonical_code(code);
        let mut scored: Vec<(f64, &String)> = self
            .fuels
            .keys()
            .map(|known| (strsim::jaro_winkler(&needle, known), known))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, known)| known.clone())
            .collect()
    }
}
