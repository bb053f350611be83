mod common;

use predicates::str::contains;
use tempfile::tempdir;

use common::{cli, fixtures_dir};

#[test]
fn lists_fixture_fuels() {
    cli()
        .arg("fuels")
        .assert()
        .success()
        .stdout(contains("Available fuels (6)"))
        .stdout(contains("BIO-DIESEL"))
        .stdout(contains("E-METHANOL"))
        .stdout(contains("42700"));
}

#[test]
fn year_selects_year_specific_prices() {
    cli()
        .args(["fuels", "--year", "2030"])
        .assert()
        .success()
        .stdout(contains("Target intensity 2030"))
        .stdout(contains("1100.00"));
}

#[test]
fn json_output_is_machine_readable() {
    let output = cli().args(["--format", "json", "fuels"]).output().unwrap();
    assert!(output.status.success());
    let fuels: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let codes: Vec<&str> = fuels
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["code"].as_str().unwrap())
        .collect();
    assert_eq!(
        codes,
        vec!["BIO-DIESEL", "E-METHANOL", "HFO", "LNG", "MDO", "VLSFO"]
    );
}

#[test]
fn data_dir_flag_accepts_csv_catalog() {
    let dir = tempdir().unwrap();
    std::fs::copy(fixtures_dir().join("fuels.csv"), dir.path().join("fuels.csv")).unwrap();
    std::fs::copy(
        fixtures_dir().join("regulatory/ghgi_targets.json"),
        dir.path().join("ghgi_targets.json"),
    )
    .unwrap();

    cli()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("fuels")
        .assert()
        .success()
        .stdout(contains("MDO"));
}

#[test]
fn missing_data_dir_fails_with_context() {
    let dir = tempdir().unwrap();
    cli()
        .arg("--data-dir")
        .arg(dir.path().join("absent"))
        .arg("fuels")
        .assert()
        .failure()
        .stderr(contains("failed to locate the regulatory data directory"));
}
