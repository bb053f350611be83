use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the fuel-mix library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a fuel code has no reference data.
    #[error("unknown fuel: {code}{}", format_suggestions(.suggestions))]
    UnknownFuel {
        code: String,
        suggestions: Vec<String>,
    },

    /// Raised when neither a year-specific nor a generic price exists for a fuel.
    #[error("no price data for fuel {fuel} in {year}")]
    NoPriceData { fuel: String, year: u16 },

    /// Raised when the fixed fuel alone already exceeds a leg's energy demand.
    #[error(
        "leg {leg} is infeasible: fixed fuel supplies {fixed_energy_mj:.0} MJ but only {required_energy_mj:.0} MJ are required"
    )]
    InfeasibleRegion {
        leg: String,
        fixed_energy_mj: f64,
        required_energy_mj: f64,
    },

    /// Raised when a blend cannot be scored without producing NaN or infinity.
    #[error("degenerate blend: {message}")]
    DegenerateBlend { message: String },

    /// Raised when a reconstructed blend drifts away from the leg's energy demand.
    #[error("energy imbalance on leg {leg}: expected {expected_mj:.3} MJ, blend provides {actual_mj:.3} MJ")]
    EnergyImbalance {
        leg: String,
        expected_mj: f64,
        actual_mj: f64,
    },

    /// Raised when a scenario, leg or optimizer setting is out of range.
    #[error("invalid scenario: {message}")]
    InvalidScenario { message: String },

    /// Raised when reference tables fail validation.
    #[error("invalid regulatory data: {message}")]
    RegulatoryDataValidation { message: String },

    /// Raised when a fuel code appears twice in a fuel table (case-insensitive).
    #[error("duplicate fuel code encountered: {code}")]
    DuplicateFuel { code: String },

    /// Reference data directory could not be located.
    #[error("regulatory data directory not found at {path}")]
    DataDirNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for regulatory data")]
    ProjectDirsUnavailable,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing and serialisation errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV reader and writer errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn invalid_scenario(message: impl Into<String>) -> Self {
        Error::InvalidScenario {
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Error::DegenerateBlend {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
