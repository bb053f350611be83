//! FuelEU GHG-intensity reduction schedule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reference GHG intensity and the per-year reduction applied to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulatoryTargets {
    /// Baseline intensity in gCO2e/MJ.
    pub reference_value: f64,
    /// Reduction in percent of the baseline, keyed by compliance year.
    pub reductions: BTreeMap<u16, f64>,
}

/// Layout of `ghgi_targets.json`; JSON object keys are year strings.
#[derive(Debug, Deserialize)]
struct RawTargets {
    reference_value: f64,
    #[serde(default)]
    targets: BTreeMap<String, f64>,
}

impl RegulatoryTargets {
    pub fn new(reference_value: f64) -> Self {
        Self {
            reference_value,
            reductions: BTreeMap::new(),
        }
    }

    pub fn with_reduction(mut self, year: u16, percent: f64) -> Self {
        self.reductions.insert(year, percent);
        self
    }

    /// Parse the JSON targets table.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawTargets = serde_json::from_str(json)?;
        let mut reductions = BTreeMap::new();
        for (key, percent) in raw.targets {
            let year = key
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::RegulatoryDataValidation {
                    message: format!("GHG target key '{key}' is not a year"),
                })?;
            reductions.insert(year, percent);
        }
        let targets = Self {
            reference_value: raw.reference_value,
            reductions,
        };
        targets.validate()?;
        Ok(targets)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.reference_value.is_finite() || self.reference_value <= 0.0 {
            return Err(Error::RegulatoryDataValidation {
                message: format!(
                    "reference_value must be a finite positive number, got {}",
                    self.reference_value
                ),
            });
        }
        for (year, percent) in &self.reductions {
            if !percent.is_finite() || !(0.0..=100.0).contains(percent) {
                return Err(Error::RegulatoryDataValidation {
                    message: format!("reduction for {year} must be within 0..=100, got {percent}"),
                });
            }
        }
        Ok(())
    }

    /// Reduction percentage for `year`; years without an entry reduce nothing.
    pub fn reduction_percent(&self, year: u16) -> f64 {
        self.reductions.get(&year).copied().unwrap_or(0.0)
    }

    /// Target GHG intensity (gCO2e/MJ) for `year`.
    pub fn ghg_intensity_target(&self, year: u16) -> f64 {
        self.reference_value * (1.0 - self.reduction_percent(year) / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_applies_year_reduction() {
        let targets = RegulatoryTargets::new(91.16).with_reduction(2030, 6.0);
        assert!((targets.ghg_intensity_target(2030) - 85.6904).abs() < 1e-9);
    }

    #[test]
    fn unmapped_year_uses_reference_value() {
        let targets = RegulatoryTargets::new(91.16).with_reduction(2030, 6.0);
        assert_eq!(targets.ghg_intensity_target(2024), 91.16);
    }

    #[test]
    fn parses_year_keyed_json() {
        let targets = RegulatoryTargets::from_json_str(
            r#"{"reference_value": 91.16, "targets": {"2025": 2, "2050": 80}}"#,
        )
        .expect("valid targets");
        assert_eq!(targets.reduction_percent(2050), 80.0);
        assert_eq!(targets.reductions.len(), 2);
    }

    #[test]
    fn rejects_reduction_above_hundred() {
        let err = RegulatoryTargets::from_json_str(
            r#"{"reference_value": 91.16, "targets": {"2025": 120}}"#,
        )
        .expect_err("reduction out of range");
        assert!(err.to_string().contains("0..=100"));
    }
}
