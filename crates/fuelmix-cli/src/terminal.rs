//! Terminal styling and number formatting for cost reports.

use std::env;
use std::ffi::OsStr;

const RESET: &str = "\x1b[0m";
const HEADING: &str = "\x1b[1;97m";
const MUTED: &str = "\x1b[90m";
const FUEL: &str = "\x1b[36m";
const SURPLUS: &str = "\x1b[32m";
const DEFICIT: &str = "\x1b[31m";

/// Escape sequences for each role in a report; empty strings when color is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    /// Section titles, leg labels and totals.
    pub heading: &'static str,
    /// Trip kinds, price ranges and other secondary figures.
    pub muted: &'static str,
    /// Fuel codes.
    pub fuel: &'static str,
    pub surplus: &'static str,
    /// Compliance deficits, losses and failed sweep cells.
    pub deficit: &'static str,
}

impl ColorPalette {
    pub const ANSI: Self = Self {
        reset: RESET,
        heading: HEADING,
        muted: MUTED,
        fuel: FUEL,
        surplus: SURPLUS,
        deficit: DEFICIT,
    };

    pub const PLAIN: Self = Self {
        reset: "",
        heading: "",
        muted: "",
        fuel: "",
        surplus: "",
        deficit: "",
    };

    /// Palette for stdout, honouring `NO_COLOR` and `TERM=dumb`.
    #[must_use]
    pub fn from_env() -> Self {
        let term = env::var("TERM").ok();
        if color_enabled(env::var_os("NO_COLOR").as_deref(), term.as_deref()) {
            Self::ANSI
        } else {
            Self::PLAIN
        }
    }

    /// Color of a signed figure such as a compliance balance or a saving.
    #[must_use]
    pub fn balance(&self, value: f64) -> &'static str {
        if value < 0.0 {
            self.deficit
        } else {
            self.surplus
        }
    }
}

/// Whether ANSI color may be used given the `NO_COLOR` and `TERM` values.
///
/// Any `NO_COLOR` value disables color (<https://no-color.org/>).
#[must_use]
pub fn color_enabled(no_color: Option<&OsStr>, term: Option<&str>) -> bool {
    no_color.is_none() && !term.is_some_and(|t| t.eq_ignore_ascii_case("dumb"))
}

/// Two decimals with comma-grouped thousands.
///
/// ```
/// # use fuelmix_cli::terminal::format_amount;
/// assert_eq!(format_amount(26_950_120.114), "26,950,120.11");
/// assert_eq!(format_amount(-42.5), "-42.50");
/// ```
#[must_use]
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    // -0.001 rounds to zero and prints unsigned.
    let negative = value < 0.0 && rounded.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let mut out = String::with_capacity(rounded.len() + whole.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out.push('.');
    out.push_str(fraction);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_group_thousands_and_round_to_cents() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1_500.05), "1,500.05");
        assert_eq!(format_amount(123_456.0), "123,456.00");
        assert_eq!(format_amount(-12_345.6), "-12,345.60");
    }

    #[test]
    fn tiny_negative_amounts_print_as_zero() {
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(-0.0), "0.00");
    }

    #[test]
    fn non_finite_amounts_are_not_grouped() {
        assert_eq!(format_amount(f64::INFINITY), "inf");
        assert_eq!(format_amount(f64::NAN), "NaN");
    }

    #[test]
    fn compliance_deficit_uses_deficit_color() {
        let palette = ColorPalette::ANSI;
        assert_eq!(palette.balance(-1.0e9), DEFICIT);
        assert_eq!(palette.balance(0.0), SURPLUS);
        assert_eq!(ColorPalette::PLAIN.balance(-1.0), "");
    }

    #[test]
    fn no_color_or_dumb_terminal_disables_color() {
        let set = Some(OsStr::new(""));
        assert!(!color_enabled(set, Some("xterm-256color")));
        assert!(!color_enabled(None, Some("DUMB")));
        assert!(color_enabled(None, Some("xterm-256color")));
        assert!(color_enabled(None, None));
    }
}
