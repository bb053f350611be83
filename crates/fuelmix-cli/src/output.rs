//! Output formatting for fuel tables, voyage breakdowns and sweep summaries.
//!
//! Text renderers write to any [`Write`] so they can be exercised against
//! a buffer; JSON output is pretty-printed `serde_json`.

use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use fuelmix_lib::{
    CostBreakdown, LegResult, OptimizedVoyage, RegulatoryData, SweepRecord, VoyageBreakdown,
};

use crate::terminal::{format_amount, ColorPalette};

const LABEL_WIDTH: usize = 22;
const AMOUNT_WIDTH: usize = 18;

/// Format of results written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Write `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Write the fuel table with prices for `year` (generic prices when `None`).
pub fn write_fuel_table<W: Write>(
    out: &mut W,
    data: &RegulatoryData,
    year: Option<u16>,
    palette: &ColorPalette,
) -> io::Result<()> {
    let fuels = data.fuels_sorted();
    if fuels.is_empty() {
        return writeln!(out, "No fuels available.");
    }

    let targets = data.targets();
    writeln!(
        out,
        "{}Available fuels ({}){}; reference intensity {:.2} gCO2e/MJ",
        palette.heading,
        fuels.len(),
        palette.reset,
        targets.reference_value
    )?;
    if let Some(year) = year {
        writeln!(
            out,
            "Target intensity {year}: {:.2} gCO2e/MJ",
            targets.ghg_intensity_target(year)
        )?;
    }
    writeln!(
        out,
        "{:<12} {:>14} {:>14} {:>10} {:>12} {:>12}",
        "Code", "LCV (MJ/t)", "WtW (g/MJ)", "CO2 (t/t)", "Price min", "Price max"
    )?;
    for fuel in fuels {
        let bounds = match year {
            Some(year) => data.price_bounds(&fuel.code, year).ok(),
            None => fuel.prices.as_ref().and_then(|p| p.generic),
        };
        let (min, max) = match bounds {
            Some(b) => (format!("{:.2}", b.price_min), format!("{:.2}", b.price_max)),
            None => ("-".to_string(), "-".to_string()),
        };
        writeln!(
            out,
            "{}{:<12}{} {:>14.0} {:>14.2} {:>10.3} {:>12} {:>12}",
            palette.fuel,
            fuel.code,
            palette.reset,
            fuel.density_mj_per_t,
            fuel.wtw_gco2e_per_mj,
            fuel.co2_t_per_t,
            min,
            max
        )?;
    }
    Ok(())
}

fn write_amount<W: Write>(out: &mut W, label: &str, value: f64, unit: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {label:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$} {unit}",
        format_amount(value)
    )
}

fn write_costs<W: Write>(
    out: &mut W,
    costs: &CostBreakdown,
    palette: &ColorPalette,
) -> io::Result<()> {
    write_amount(out, "Fuel cost (avg)", costs.fuel_cost.average, "EUR")?;
    writeln!(
        out,
        "  {}{:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$} EUR{}",
        palette.muted,
        "  range",
        format!(
            "{} - {}",
            format_amount(costs.fuel_cost.min),
            format_amount(costs.fuel_cost.max)
        ),
        palette.reset
    )?;
    write_amount(out, "CO2 emitted", costs.co2_emissions_t, "t")?;
    write_amount(out, "ETS allowances", costs.ets_emissions_t, "t")?;
    write_amount(out, "ETS penalty", costs.ets_penalty, "EUR")?;
    writeln!(
        out,
        "  {:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$.3} gCO2e/MJ (target {:.3})",
        "GHG intensity", costs.ghg_intensity_actual, costs.ghg_intensity_target
    )?;
    writeln!(
        out,
        "  {:<LABEL_WIDTH$}{}{:>AMOUNT_WIDTH$}{} gCO2e",
        "Compliance balance",
        palette.balance(costs.compliance_balance),
        format_amount(costs.compliance_balance),
        palette.reset
    )?;
    write_amount(out, "FuelEU penalty", costs.fueleu_penalty, "EUR")?;
    if costs.ops_cost > 0.0 || costs.ops_penalty > 0.0 {
        write_amount(out, "OPS cost", costs.ops_cost, "EUR")?;
        write_amount(out, "OPS penalty", costs.ops_penalty, "EUR")?;
    }
    writeln!(
        out,
        "  {}{:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$} EUR{}",
        palette.heading,
        "Total cost",
        format_amount(costs.total_cost),
        palette.reset
    )
}

fn write_leg<W: Write>(out: &mut W, leg: &LegResult, palette: &ColorPalette) -> io::Result<()> {
    writeln!(
        out,
        "{}Leg {}{} {}[{}]{}",
        palette.heading, leg.label, palette.reset, palette.muted, leg.kind, palette.reset
    )?;
    if leg.blend.is_empty() {
        writeln!(out, "  {}on shore power{}", palette.muted, palette.reset)?;
    }
    for (fuel, tonnes) in leg.blend.iter() {
        let share = leg.percentages.get(fuel).copied().unwrap_or(0.0);
        writeln!(
            out,
            "  {}{:<12}{} {:>14} t {:>8.2} %",
            palette.fuel,
            fuel,
            palette.reset,
            format_amount(tonnes),
            share
        )?;
    }
    write_costs(out, &leg.breakdown, palette)
}

/// Write every leg and the voyage totals.
pub fn write_voyage<W: Write>(
    out: &mut W,
    voyage: &VoyageBreakdown,
    palette: &ColorPalette,
) -> io::Result<()> {
    for leg in &voyage.legs {
        write_leg(out, leg, palette)?;
        writeln!(out)?;
    }
    writeln!(
        out,
        "{}Voyage totals{} {}({} FuelEU compliance){}",
        palette.heading, palette.reset, palette.muted, voyage.aggregation, palette.reset
    )?;
    write_costs(out, &voyage.totals, palette)
}

/// Write an optimisation result: solver summary, per-leg blends and totals.
pub fn write_optimized<W: Write>(
    out: &mut W,
    result: &OptimizedVoyage,
    palette: &ColorPalette,
) -> io::Result<()> {
    writeln!(
        out,
        "Optimisation {} ({}): {} after {} iterations, {} evaluations",
        result.strategy, result.aggregation, result.status, result.iterations, result.evaluations
    )?;
    writeln!(out)?;
    write_voyage(out, &result.breakdown, palette)?;
    writeln!(out)?;
    write_amount(out, "Baseline cost", result.baseline_cost, "EUR")?;
    let savings = result.savings();
    writeln!(
        out,
        "  {:<LABEL_WIDTH$}{}{:>AMOUNT_WIDTH$}{} EUR",
        "Savings",
        palette.balance(savings),
        format_amount(savings),
        palette.reset
    )
}

/// Summarise a sweep whose records were exported to `path`.
pub fn write_sweep_summary<W: Write>(
    out: &mut W,
    records: &[SweepRecord],
    path: &Path,
    palette: &ColorPalette,
) -> io::Result<()> {
    let failed: Vec<&SweepRecord> = records.iter().filter(|r| !r.is_success()).collect();
    writeln!(
        out,
        "Sweep complete: {} cells, {} failed; results written to {}",
        records.len(),
        failed.len(),
        path.display()
    )?;
    for record in failed {
        writeln!(
            out,
            "  {}{} @ {:.2} EUR/t: {}{}",
            palette.deficit,
            record.year,
            record.co2_price,
            record.error.as_deref().unwrap_or("unknown error"),
            palette.reset
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelmix_lib::{FuelProperties, PriceBounds, PriceSchedule, RegulatoryTargets};

    fn data() -> RegulatoryData {
        RegulatoryData::new(
            [
                FuelProperties::new("MDO", 42_700.0, 90.77, 3.206)
                    .with_prices(PriceSchedule::generic(PriceBounds::new(700.0, 800.0))),
                FuelProperties::new("LNG", 49_100.0, 80.0, 2.75),
            ],
            RegulatoryTargets::new(91.16).with_reduction(2030, 6.0),
        )
        .unwrap()
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn fuel_table_lists_sorted_fuels_with_missing_prices() {
        let text = render(|out| write_fuel_table(out, &data(), None, &ColorPalette::PLAIN));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Available fuels (2)"));
        assert!(lines[2].starts_with("LNG"));
        assert!(lines[2].ends_with("-"));
        assert!(lines[3].starts_with("MDO"));
        assert!(lines[3].contains("700.00"));
    }

    #[test]
    fn fuel_table_shows_target_for_year() {
        let text = render(|out| write_fuel_table(out, &data(), Some(2030), &ColorPalette::PLAIN));
        assert!(text.contains("Target intensity 2030: 85.69 gCO2e/MJ"));
    }

    #[test]
    fn sweep_summary_lists_failed_cells() {
        let record = SweepRecord {
            year: 2035,
            co2_price: 90.0,
            status: None,
            total_cost: None,
            fuel_cost: None,
            ets_penalty: None,
            fueleu_penalty: None,
            ets_allowances: None,
            compliance_balance: None,
            ops_cost: None,
            ops_penalty: None,
            error: Some("no price data for fuel X in 2035".to_string()),
        };
        let text = render(|out| {
            write_sweep_summary(out, &[record], Path::new("out.csv"), &ColorPalette::PLAIN)
        });
        assert!(text.contains("1 cells, 1 failed"));
        assert!(text.contains("2035 @ 90.00 EUR/t: no price data"));
    }

    #[test]
    fn json_ends_with_newline() {
        let text = render(|out| write_json(out, &vec![1, 2]));
        assert!(text.ends_with("]\n"));
    }
}
