//! Unit tables and best-unit selection
//!
//! Quantities are stored in internal units (nanoseconds for time). For
//! reporting, a value is expressed in the unit of its category that keeps the
//! printed number closest to, but not below, one.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub const NANOSECOND: f64 = 1.0;
pub const PICOSECOND: f64 = 1.0e-3 * NANOSECOND;
pub const MICROSECOND: f64 = 1.0e3 * NANOSECOND;
pub const MILLISECOND: f64 = 1.0e6 * NANOSECOND;
pub const SECOND: f64 = 1.0e9 * NANOSECOND;
pub const MINUTE: f64 = 60.0 * SECOND;
pub const HOUR: f64 = 60.0 * MINUTE;
pub const DAY: f64 = 24.0 * HOUR;
pub const YEAR: f64 = 365.0 * DAY;

/// A named unit and its size in internal units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub symbol: &'static str,
    pub value: f64,
}

const TIME_UNITS: [Unit; 9] = [
    Unit { symbol: "s", value: SECOND },
    Unit { symbol: "ms", value: MILLISECOND },
    Unit { symbol: "us", value: MICROSECOND },
    Unit { symbol: "ns", value: NANOSECOND },
    Unit { symbol: "ps", value: PICOSECOND },
    Unit { symbol: "min", value: MINUTE },
    Unit { symbol: "h", value: HOUR },
    Unit { symbol: "d", value: DAY },
    Unit { symbol: "y", value: YEAR },
];

/// Unit categories with a best-unit table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    Time,
}

impl UnitCategory {
    pub fn name(self) -> &'static str {
        match self {
            Self::Time => "Time",
        }
    }

    /// Units of this category, first entry is the fallback
    pub fn units(self) -> &'static [Unit] {
        match self {
            Self::Time => &TIME_UNITS,
        }
    }

    /// Express `value` (internal units) in the best unit of this category.
    ///
    /// Picks the unit with the smallest ratio `|value| / unit >= 1`; if every
    /// ratio is below one, the unit with the largest ratio. Zero and
    /// non-finite values use the first unit of the table.
    pub fn best_unit(self, value: f64) -> (f64, &'static str) {
        let units = self.units();
        let fallback = units[0];
        if value == 0.0 || !value.is_finite() {
            return (value / fallback.value, fallback.symbol);
        }

        let magnitude = value.abs();
        let at_least_one = units
            .iter()
            .filter(|u| magnitude / u.value >= 1.0)
            .min_by(|a, b| (magnitude / a.value).total_cmp(&(magnitude / b.value)));
        let unit = at_least_one
            .or_else(|| {
                units
                    .iter()
                    .max_by(|a, b| (magnitude / a.value).total_cmp(&(magnitude / b.value)))
            })
            .copied()
            .unwrap_or(fallback);
        (value / unit.value, unit.symbol)
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            _ => Err(Error::Configuration(format!("unknown unit category '{s}'"))),
        }
    }
}

/// Shorthand for [`UnitCategory::best_unit`] on time values
pub fn best_time_unit(value: f64) -> (f64, &'static str) {
    UnitCategory::Time.best_unit(value)
}
