//! Common test utilities and fixture helpers.

use std::fs;
use std::path::PathBuf;

use fuelmix_lib::{load_regulatory_data, RegulatoryData, Scenario};
use tempfile::TempDir;

/// Path to fixtures directory used by tests.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Directory holding the JSON reference tables.
#[allow(dead_code)]
pub fn regulatory_dir() -> PathBuf {
    fixtures_dir().join("regulatory")
}

/// Reference data loaded from the checked-in JSON tables.
#[allow(dead_code)]
pub fn fixture_data() -> RegulatoryData {
    load_regulatory_data(&regulatory_dir()).expect("fixture regulatory data loads")
}

/// Load a scenario from `docs/fixtures/scenarios`.
#[allow(dead_code)]
pub fn fixture_scenario(name: &str) -> Scenario {
    Scenario::from_path(&fixtures_dir().join("scenarios").join(name))
        .expect("fixture scenario loads")
}

/// Temporary data directory with `fuels.csv` and the targets table.
#[allow(dead_code)]
pub fn csv_data_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::copy(fixtures_dir().join("fuels.csv"), dir.path().join("fuels.csv"))
        .expect("copy fuels.csv");
    fs::copy(
        regulatory_dir().join("ghgi_targets.json"),
        dir.path().join("ghgi_targets.json"),
    )
    .expect("copy targets");
    dir
}
