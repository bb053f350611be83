//! Locating and loading the reference tables from disk.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::catalog::fuels_from_csv_reader;
use super::fuel::{canonical_code, FuelProperties, RawPriceEntry};
use super::store::RegulatoryData;
use super::targets::RegulatoryTargets;

pub const FUEL_DENSITY_FILE: &str = "fuel_density.json";
pub const WTW_FACTORS_FILE: &str = "wtw_factors.json";
pub const CO2_FACTORS_FILE: &str = "co2_emission_factors.json";
pub const FUEL_PRICES_FILE: &str = "fuel_prices.json";
pub const GHGI_TARGETS_FILE: &str = "ghgi_targets.json";
pub const FUELS_CSV_FILE: &str = "fuels.csv";

/// Environment variable overriding the reference data directory.
pub const DATA_DIR_ENV: &str = "FUELMIX_DATA_DIR";

/// Checked-in reference tables, used as a last resort in debug builds.
static FIXTURE_DATA_DIR: Lazy<Option<PathBuf>> = Lazy::new(|| {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/regulatory");
    path.canonicalize().ok()
});

/// Platform data directory for reference tables.
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("eu", "fuelmix", "fuelmix").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join("regulatory"))
}

/// Resolve the reference data directory.
///
/// Resolution order:
/// 1. Explicit `target` argument when provided.
/// 2. `FUELMIX_DATA_DIR` environment variable.
/// 3. Platform-specific project data directory, when it exists.
/// 4. The checked-in fixture tables (debug builds only).
pub fn resolve_data_dir(target: Option<&Path>) -> Result<PathBuf> {
    if let Some(explicit) = target {
        return existing_dir(explicit.to_path_buf());
    }

    if let Some(env_path) = env::var_os(DATA_DIR_ENV) {
        return existing_dir(PathBuf::from(env_path));
    }

    let default = default_data_dir()?;
    if default.is_dir() {
        return Ok(default);
    }

    if cfg!(debug_assertions) {
        if let Some(fixture) = FIXTURE_DATA_DIR.as_ref() {
            debug!(
                path = %fixture.display(),
                "falling back to checked-in regulatory fixtures"
            );
            return Ok(fixture.clone());
        }
    }

    Err(Error::DataDirNotFound { path: default })
}

fn existing_dir(path: PathBuf) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(Error::DataDirNotFound { path })
    }
}

/// Load reference data from a directory.
///
/// A `fuels.csv` in the directory replaces the four per-fuel JSON tables;
/// `ghgi_targets.json` is always required.
pub fn load_regulatory_data(dir: &Path) -> Result<RegulatoryData> {
    if !dir.is_dir() {
        return Err(Error::DataDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let targets = RegulatoryTargets::from_json_str(&read_file(dir, GHGI_TARGETS_FILE)?)?;

    let csv_path = dir.join(FUELS_CSV_FILE);
    let data = if csv_path.is_file() {
        debug!(path = %csv_path.display(), "loading combined fuel table");
        let fuels = fuels_from_csv_reader(fs::File::open(&csv_path)?)?;
        RegulatoryData::new(fuels, targets)?
    } else {
        from_json_tables(
            &read_file(dir, FUEL_DENSITY_FILE)?,
            &read_file(dir, WTW_FACTORS_FILE)?,
            &read_file(dir, CO2_FACTORS_FILE)?,
            &read_file(dir, FUEL_PRICES_FILE)?,
            targets,
        )?
    };

    info!(
        fuels = data.fuel_codes().len(),
        path = %dir.display(),
        "loaded regulatory data"
    );
    Ok(data.with_source(dir.to_path_buf()))
}

/// Build the store from the contents of the per-fuel JSON tables.
///
/// The density table defines the fuel set; every density entry must have a
/// WtW factor and a CO2 factor. Price entries are optional per fuel.
pub fn from_json_tables(
    density_json: &str,
    wtw_json: &str,
    co2_json: &str,
    prices_json: &str,
    targets: RegulatoryTargets,
) -> Result<RegulatoryData> {
    let densities: BTreeMap<String, f64> = parse_keyed(density_json, FUEL_DENSITY_FILE)?;
    let wtw: BTreeMap<String, f64> = parse_keyed(wtw_json, WTW_FACTORS_FILE)?;
    let co2: BTreeMap<String, f64> = parse_keyed(co2_json, CO2_FACTORS_FILE)?;
    let mut prices: BTreeMap<String, RawPriceEntry> = parse_keyed(prices_json, FUEL_PRICES_FILE)?;

    let mut fuels = Vec::with_capacity(densities.len());
    for (code, density) in densities {
        let wtw_factor = *wtw.get(&code).ok_or_else(|| missing(&code, WTW_FACTORS_FILE))?;
        let co2_factor = *co2.get(&code).ok_or_else(|| missing(&code, CO2_FACTORS_FILE))?;
        let mut fuel = FuelProperties::new(&code, density, wtw_factor, co2_factor);
        if let Some(entry) = prices.remove(&code) {
            fuel = fuel.with_prices(entry.into_schedule(&code)?);
        }
        fuels.push(fuel);
    }

    for orphan in prices.keys() {
        warn!(fuel = %orphan, "price entry has no density and is ignored");
    }

    RegulatoryData::new(fuels, targets)
}

fn missing(code: &str, file: &str) -> Error {
    Error::RegulatoryDataValidation {
        message: format!("{code} has a density but no entry in {file}"),
    }
}

fn read_file(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).map_err(|err| Error::RegulatoryDataValidation {
        message: format!("failed to read {}: {err}", path.display()),
    })
}

/// Parse a fuel-keyed JSON object, canonicalising keys and rejecting
/// case-insensitive duplicates.
fn parse_keyed<T: DeserializeOwned>(json: &str, file: &str) -> Result<BTreeMap<String, T>> {
    let raw: BTreeMap<String, T> = serde_json::from_str(json).map_err(|err| {
        Error::RegulatoryDataValidation {
            message: format!("{file}: {err}"),
        }
    })?;

    let mut table = BTreeMap::new();
    for (key, value) in raw {
        let code = canonical_code(&key);
        if table.insert(code.clone(), value).is_some() {
            return Err(Error::DuplicateFuel { code });
        }
    }
    Ok(table)
}
