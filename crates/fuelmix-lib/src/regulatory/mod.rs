//! Regulatory reference data: fuel factors, prices and GHG-intensity targets.

mod catalog;
mod fuel;
mod loader;
mod store;
mod targets;

pub use catalog::fuels_from_csv_reader;
pub use fuel::{canonical_code, FuelProperties, PriceBounds, PriceSchedule};
pub use loader::{
    default_data_dir, from_json_tables, load_regulatory_data, resolve_data_dir,
    CO2_FACTORS_FILE, DATA_DIR_ENV, FUELS_CSV_FILE, FUEL_DENSITY_FILE, FUEL_PRICES_FILE,
    GHGI_TARGETS_FILE, WTW_FACTORS_FILE,
};
pub use store::RegulatoryData;
pub use targets::RegulatoryTargets;
