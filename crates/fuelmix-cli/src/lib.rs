//! Fuel-mix CLI library.
//!
//! Terminal styling and result rendering shared by the `fuelmix-cli`
//! subcommands.

pub mod output;
pub mod terminal;
