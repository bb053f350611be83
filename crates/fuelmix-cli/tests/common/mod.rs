//! Shared helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .canonicalize()
        .expect("fixtures directory present")
}

/// Path to a checked-in scenario file.
#[allow(dead_code)]
pub fn fixture_scenario(name: &str) -> PathBuf {
    fixtures_dir().join("scenarios").join(name)
}

/// CLI command wired to the fixture reference data, with plain output and quiet logs.
pub fn cli() -> Command {
    let mut cmd = cargo_bin_cmd!("fuelmix-cli");
    cmd.env("FUELMIX_DATA_DIR", fixtures_dir().join("regulatory"))
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1");
    cmd
}
