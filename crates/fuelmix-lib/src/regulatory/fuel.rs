//! Per-fuel reference properties and price schedules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Price range for one tonne of fuel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub price_min: f64,
    pub price_max: f64,
}

impl PriceBounds {
    pub fn new(price_min: f64, price_max: f64) -> Self {
        Self {
            price_min,
            price_max,
        }
    }

    /// Midpoint of the price range.
    pub fn average(&self) -> f64 {
        (self.price_min + self.price_max) / 2.0
    }

    fn validate(&self, code: &str, label: &str) -> Result<()> {
        for (value, field) in [(self.price_min, "price_min"), (self.price_max, "price_max")] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::RegulatoryDataValidation {
                    message: format!("{field} for {code} ({label}) must be a finite non-negative number"),
                });
            }
        }
        if self.price_min > self.price_max {
            return Err(Error::RegulatoryDataValidation {
                message: format!(
                    "price_min exceeds price_max for {code} ({label}): {} > {}",
                    self.price_min, self.price_max
                ),
            });
        }
        Ok(())
    }
}

/// Generic and year-specific prices for a fuel.
///
/// Year entries take precedence; the generic bounds are the fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSchedule {
    pub generic: Option<PriceBounds>,
    pub by_year: BTreeMap<u16, PriceBounds>,
}

impl PriceSchedule {
    pub fn generic(bounds: PriceBounds) -> Self {
        Self {
            generic: Some(bounds),
            by_year: BTreeMap::new(),
        }
    }

    pub fn with_year(mut self, year: u16, bounds: PriceBounds) -> Self {
        self.by_year.insert(year, bounds);
        self
    }

    /// Resolve the bounds applicable in `year`.
    pub fn bounds_for(&self, year: u16) -> Option<PriceBounds> {
        self.by_year.get(&year).copied().or(self.generic)
    }

    fn validate(&self, code: &str) -> Result<()> {
        if let Some(generic) = &self.generic {
            generic.validate(code, "generic")?;
        }
        for (year, bounds) in &self.by_year {
            bounds.validate(code, &year.to_string())?;
        }
        Ok(())
    }
}

/// Price entry as stored in `fuel_prices.json`.
///
/// The generic bounds sit at the top level; any other key is a compliance
/// year mapping to its own bounds.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPriceEntry {
    price_min: Option<f64>,
    price_max: Option<f64>,
    #[serde(flatten)]
    by_year: BTreeMap<String, PriceBounds>,
}

impl RawPriceEntry {
    pub(crate) fn into_schedule(self, code: &str) -> Result<PriceSchedule> {
        let generic = match (self.price_min, self.price_max) {
            (Some(min), Some(max)) => Some(PriceBounds::new(min, max)),
            (None, None) => None,
            _ => {
                return Err(Error::RegulatoryDataValidation {
                    message: format!("{code} must define both price_min and price_max"),
                })
            }
        };

        let mut by_year = BTreeMap::new();
        for (key, bounds) in self.by_year {
            let year = key
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::RegulatoryDataValidation {
                    message: format!("{code} has price entry '{key}' that is not a year"),
                })?;
            by_year.insert(year, bounds);
        }

        Ok(PriceSchedule { generic, by_year })
    }
}

/// Reference properties for one fuel type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelProperties {
    /// Canonical (upper-case) fuel code.
    pub code: String,
    /// Lower calorific value in MJ per tonne.
    pub density_mj_per_t: f64,
    /// Well-to-wake GHG intensity in gCO2e per MJ.
    pub wtw_gco2e_per_mj: f64,
    /// Tonnes of CO2 emitted per tonne of fuel burnt.
    pub co2_t_per_t: f64,
    /// Price schedule; `None` when the fuel has no price entry at all.
    pub prices: Option<PriceSchedule>,
}

impl FuelProperties {
    pub fn new(
        code: impl AsRef<str>,
        density_mj_per_t: f64,
        wtw_gco2e_per_mj: f64,
        co2_t_per_t: f64,
    ) -> Self {
        Self {
            code: canonical_code(code.as_ref()),
            density_mj_per_t,
            wtw_gco2e_per_mj,
            co2_t_per_t,
            prices: None,
        }
    }

    pub fn with_prices(mut self, prices: PriceSchedule) -> Self {
        self.prices = Some(prices);
        self
    }

    /// Validate physical factors and price bounds.
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(Error::RegulatoryDataValidation {
                message: "fuel code must not be empty".to_string(),
            });
        }

        let fields = [
            (self.density_mj_per_t, "density"),
            (self.wtw_gco2e_per_mj, "wtw factor"),
            (self.co2_t_per_t, "co2 emission factor"),
        ];
        for (value, field) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::RegulatoryDataValidation {
                    message: format!("{field} for {} must be a finite positive number", self.code),
                });
            }
        }

        if let Some(prices) = &self.prices {
            prices.validate(&self.code)?;
        }
        Ok(())
    }
}

/// Canonicalise a fuel code for case-insensitive lookup.
pub fn canonical_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_take_precedence_over_generic() {
        let schedule = PriceSchedule::generic(PriceBounds::new(100.0, 200.0))
            .with_year(2030, PriceBounds::new(50.0, 70.0));
        assert_eq!(schedule.bounds_for(2030), Some(PriceBounds::new(50.0, 70.0)));
        assert_eq!(schedule.bounds_for(2031), Some(PriceBounds::new(100.0, 200.0)));
    }

    #[test]
    fn raw_entry_splits_generic_and_year_keys() {
        let json = r#"{"price_min": 1, "price_max": 3, "2040": {"price_min": 2, "price_max": 4}}"#;
        let raw: RawPriceEntry = serde_json::from_str(json).expect("valid entry");
        let schedule = raw.into_schedule("E-METHANOL").expect("schedule");
        assert_eq!(schedule.generic, Some(PriceBounds::new(1.0, 3.0)));
        assert_eq!(schedule.by_year[&2040].average(), 3.0);
    }

    #[test]
    fn raw_entry_rejects_non_year_keys() {
        let json = r#"{"price_min": 1, "price_max": 3, "soon": {"price_min": 2, "price_max": 4}}"#;
        let raw: RawPriceEntry = serde_json::from_str(json).expect("valid json");
        let err = raw.into_schedule("LNG").expect_err("non-year key");
        assert!(err.to_string().contains("not a year"));
    }

    #[test]
    fn inverted_price_bounds_fail_validation() {
        let fuel = FuelProperties::new("mdo", 42_700.0, 90.77, 3.206)
            .with_prices(PriceSchedule::generic(PriceBounds::new(800.0, 700.0)));
        assert_eq!(fuel.code, "MDO");
        let err = fuel.validate().expect_err("min > max");
        assert!(err.to_string().contains("price_min exceeds price_max"));
    }

    #[test]
    fn zero_density_fails_validation() {
        let fuel = FuelProperties::new("LNG", 0.0, 80.0, 2.75);
        match fuel.validate() {
            Err(Error::RegulatoryDataValidation { message }) => {
                assert!(message.contains("density"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
