//! Combined fuel table loading from `fuels.csv`.
//!
//! The CSV form carries one row per fuel with its physical factors and
//! generic price bounds. Year-specific prices are only available through
//! the JSON tables.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use csv::{ReaderBuilder, Trim};

use crate::error::{Error, Result};

use super::fuel::{canonical_code, FuelProperties, PriceBounds, PriceSchedule};

/// Canonical column name -> accepted header synonyms (normalised).
const COLUMN_SYNONYMS: &[(&str, &[&str])] = &[
    ("code", &["code", "fuel", "fuel_code", "fuel_type", "name"]),
    (
        "density",
        &["density", "density_mj_per_t", "densitymjt", "lcv", "energy_density"],
    ),
    (
        "wtw",
        &["wtw", "wtw_factor", "wtwgco2emj", "wtw_gco2e_per_mj", "ghg_intensity"],
    ),
    (
        "co2",
        &["co2", "co2_factor", "co2factor", "co2_t_per_t", "cf"],
    ),
    ("price_min", &["price_min", "pricemin", "min_price"]),
    ("price_max", &["price_max", "pricemax", "max_price"]),
];

const REQUIRED_COLUMNS: &[&str] = &["code", "density", "wtw", "co2"];

/// Normalise a header for robust matching.
fn normalize_header(s: &str) -> String {
    s.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Parse fuel definitions from a CSV reader.
pub fn fuels_from_csv_reader<R: Read>(reader: R) -> Result<Vec<FuelProperties>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| Error::RegulatoryDataValidation {
            message: format!("failed to read fuels.csv headers: {err}"),
        })?
        .clone();
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

    let mut index_map: BTreeMap<&str, usize> = BTreeMap::new();
    for (canon, alts) in COLUMN_SYNONYMS {
        'outer: for alt in *alts {
            let alt_n = normalize_header(alt);
            for (i, h) in normalized.iter().enumerate() {
                if h == &alt_n {
                    index_map.insert(*canon, i);
                    break 'outer;
                }
            }
        }
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !index_map.contains_key(c))
        .collect();
    if !missing.is_empty() {
        return Err(Error::RegulatoryDataValidation {
            message: format!(
                "fuels.csv missing required columns: {}. Available: {}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let mut fuels = Vec::new();
    let mut seen = HashSet::new();
    let mut row_num: usize = 1;
    for result in csv_reader.records() {
        row_num += 1;
        let record = result?;

        let get = |field: &str| -> Option<&str> {
            index_map
                .get(field)
                .and_then(|&i| record.get(i))
                .filter(|s| !s.is_empty())
        };
        let number = |field: &str, code: &str| -> Result<Option<f64>> {
            get(field)
                .map(|raw| {
                    raw.parse::<f64>()
                        .map_err(|e| Error::RegulatoryDataValidation {
                            message: format!("invalid {field} for fuel '{code}' at row {row_num}: {e}"),
                        })
                })
                .transpose()
        };
        let required = |field: &str, code: &str| -> Result<f64> {
            number(field, code)?.ok_or_else(|| Error::RegulatoryDataValidation {
                message: format!("missing {field} for fuel '{code}' at row {row_num}"),
            })
        };

        let code = canonical_code(get("code").unwrap_or_default());
        let mut fuel = FuelProperties::new(
            &code,
            required("density", &code)?,
            required("wtw", &code)?,
            required("co2", &code)?,
        );

        match (number("price_min", &code)?, number("price_max", &code)?) {
            (Some(min), Some(max)) => {
                fuel = fuel.with_prices(PriceSchedule::generic(PriceBounds::new(min, max)));
            }
            (None, None) => {}
            _ => {
                return Err(Error::RegulatoryDataValidation {
                    message: format!(
                        "fuel '{code}' at row {row_num} must define both price_min and price_max"
                    ),
                })
            }
        }

        fuel.validate()?;
        if !seen.insert(fuel.code.clone()) {
            return Err(Error::DuplicateFuel { code: fuel.code });
        }
        fuels.push(fuel);
    }

    Ok(fuels)
}
