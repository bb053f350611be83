mod common;

use predicates::str::contains;

use common::{cli, fixture_scenario};

#[test]
fn evaluates_given_blend() {
    cli()
        .arg("evaluate")
        .arg(fixture_scenario("single_leg.json"))
        .assert()
        .success()
        .stdout(contains("Leg intra-eu [intra-eu]"))
        .stdout(contains("VLSFO"))
        .stdout(contains("Voyage totals (pooled FuelEU compliance)"))
        .stdout(contains("Total cost"));
}

#[test]
fn evaluation_json_carries_totals() {
    let output = cli()
        .args(["--format", "json", "evaluate"])
        .arg(fixture_scenario("single_leg.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let breakdown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let totals = &breakdown["totals"];
    assert!((totals["energy_mj"].as_f64().unwrap() - 1.0e6).abs() < 1.0);
    assert!(totals["total_cost"].as_f64().unwrap() > 0.0);
    assert_eq!(breakdown["legs"].as_array().unwrap().len(), 1);
}

#[test]
fn scenario_without_blends_is_rejected() {
    cli()
        .arg("evaluate")
        .arg(fixture_scenario("three_legs.json"))
        .assert()
        .failure()
        .stderr(contains("has no blend to evaluate"));
}
