// crates/network/src/size.rs
//! Human-readable byte sizes

/// Decimal places used for the rounding test when none is given
pub const DEFAULT_PRECISION: i32 = 1;

const DECIMAL_UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];
const BINARY_UNITS: [&str; 4] = ["kiB", "MiB", "GiB", "TiB"];

/// Unit ladder to format with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    /// Powers of 1000: kB, MB, GB, TB
    Decimal,
    /// Powers of 1024: kiB, MiB, GiB, TiB
    #[default]
    Binary,
}

impl UnitSystem {
    pub fn divisor(self) -> f64 {
        match self {
            UnitSystem::Decimal => 1000.0,
            UnitSystem::Binary => 1024.0,
        }
    }

    pub fn units(self) -> &'static [&'static str] {
        match self {
            UnitSystem::Decimal => &DECIMAL_UNITS,
            UnitSystem::Binary => &BINARY_UNITS,
        }
    }
}

/// Formats `bytes` as `"<value> <unit>"`.
///
/// The value is always divided at least once, so the smallest unit shown is
/// kB / kiB, never bare bytes. It keeps dividing while the magnitude, rounded
/// to `precision` decimals, is still at least one divisor and a larger unit
/// exists. The value is printed with two decimals whatever `precision` is.
pub fn human_readable_size(bytes: i64, units: UnitSystem, precision: i32) -> String {
    let divisor = units.divisor();
    let ladder = units.units();
    let factor = 10f64.powi(precision);

    let mut size = bytes as f64 / divisor;
    let mut index = 0;
    while (size.abs() * factor).round() / factor >= divisor && index < ladder.len() - 1 {
        size /= divisor;
        index += 1;
    }

    format!("{:.2} {}", size, ladder[index])
}

/// Same as [`human_readable_size`], selecting the ladder with a flag
pub fn format_size(bytes: i64, use_decimal_units: bool, precision: i32) -> String {
    let units = if use_decimal_units {
        UnitSystem::Decimal
    } else {
        UnitSystem::Binary
    };
    human_readable_size(bytes, units, precision)
}
