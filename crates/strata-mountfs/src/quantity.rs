//! Operator-supplied quantity strings.
//!
//! Administrative surfaces accept thresholds either as a percentage of
//! a mountpath's capacity (`"90%"`) or as an absolute byte count with
//! an IEC suffix (`"10GiB"`). This module parses and renders both.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// A parsed quantity: either a percentage or an absolute byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedQuantity {
    /// A percentage, strictly inside `(0, 100)`.
    Percent(u64),
    /// An absolute number of bytes.
    Bytes(u64),
}

/// Errors from parsing a quantity string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is not `<number><unit>` with a recognized unit.
    #[error("invalid quantity {0:?}: expected <number> followed by % or an IEC size suffix")]
    Malformed(String),

    /// A percentage outside the open interval `(0, 100)`.
    #[error("percent quantity must be within (0, 100), got {0}")]
    PercentOutOfRange(u64),

    /// The numeric part overflows when scaled by its suffix.
    #[error("quantity {0:?} overflows a byte count")]
    Overflow(String),
}

/// Parse a quantity string such as `"95%"`, `"10GiB"`, or `"512 KiB"`.
///
/// Whitespace is ignored. Size suffixes are IEC (`B`, `KiB`, `MiB`,
/// `GiB`, `TiB`), case-insensitive, with `K`/`KB` style shorthands
/// accepted as their IEC equivalents. A bare number is rejected: the
/// caller must say what the number means.
pub fn parse_quantity(input: &str) -> Result<ParsedQuantity, QuantityError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    let digits_end = compact
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(compact.len());
    let (number, suffix) = compact.split_at(digits_end);

    let value: u64 = number
        .parse()
        .map_err(|_| QuantityError::Malformed(input.to_string()))?;

    if suffix == "%" {
        if value == 0 || value >= 100 {
            return Err(QuantityError::PercentOutOfRange(value));
        }
        return Ok(ParsedQuantity::Percent(value));
    }

    let multiplier = match suffix.to_ascii_lowercase().as_str() {
        "b" => 1,
        "k" | "kb" | "kib" => KIB,
        "m" | "mb" | "mib" => MIB,
        "g" | "gb" | "gib" => GIB,
        "t" | "tb" | "tib" => TIB,
        _ => return Err(QuantityError::Malformed(input.to_string())),
    };

    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| QuantityError::Overflow(input.to_string()))?;
    Ok(ParsedQuantity::Bytes(bytes))
}

/// Render a byte count with the largest fitting IEC unit.
pub fn to_size_iec(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{}B", bytes)
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

impl fmt::Display for ParsedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedQuantity::Percent(pct) => write!(f, "{}%", pct),
            ParsedQuantity::Bytes(bytes) => write!(f, "{}", to_size_iec(*bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_quantity("95%").unwrap(), ParsedQuantity::Percent(95));
        assert_eq!(parse_quantity("1%").unwrap(), ParsedQuantity::Percent(1));
        assert_eq!(parse_quantity(" 42 %").unwrap(), ParsedQuantity::Percent(42));
    }

    #[test]
    fn test_parse_percent_out_of_range() {
        assert_eq!(
            parse_quantity("0%").unwrap_err(),
            QuantityError::PercentOutOfRange(0)
        );
        assert_eq!(
            parse_quantity("100%").unwrap_err(),
            QuantityError::PercentOutOfRange(100)
        );
        assert_eq!(
            parse_quantity("250%").unwrap_err(),
            QuantityError::PercentOutOfRange(250)
        );
    }

    #[test]
    fn test_parse_iec_sizes() {
        assert_eq!(parse_quantity("512B").unwrap(), ParsedQuantity::Bytes(512));
        assert_eq!(
            parse_quantity("10GiB").unwrap(),
            ParsedQuantity::Bytes(10 * GIB)
        );
        assert_eq!(
            parse_quantity("10 gib").unwrap(),
            ParsedQuantity::Bytes(10 * GIB)
        );
        assert_eq!(
            parse_quantity("3TB").unwrap(),
            ParsedQuantity::Bytes(3 * TIB)
        );
        assert_eq!(parse_quantity("8K").unwrap(), ParsedQuantity::Bytes(8 * KIB));
        assert_eq!(
            parse_quantity("100MiB").unwrap(),
            ParsedQuantity::Bytes(100 * MIB)
        );
    }

    #[test]
    fn test_bare_number_is_rejected() {
        assert_eq!(
            parse_quantity("1024").unwrap_err(),
            QuantityError::Malformed("1024".to_string())
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        for input in ["", "%", "GiB", "ten GiB", "10XiB", "-5%"] {
            assert!(
                matches!(parse_quantity(input), Err(QuantityError::Malformed(_))),
                "expected {:?} to be malformed",
                input
            );
        }
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(matches!(
            parse_quantity("18446744073709551615TiB"),
            Err(QuantityError::Overflow(_))
        ));
    }

    #[test]
    fn test_display_percent() {
        assert_eq!(format!("{}", ParsedQuantity::Percent(90)), "90%");
    }

    #[test]
    fn test_display_bytes_uses_largest_unit() {
        assert_eq!(format!("{}", ParsedQuantity::Bytes(512)), "512B");
        assert_eq!(format!("{}", ParsedQuantity::Bytes(2 * KIB)), "2.00KiB");
        assert_eq!(
            format!("{}", ParsedQuantity::Bytes(5 * GIB + GIB / 2)),
            "5.50GiB"
        );
    }

    #[test]
    fn test_display_parse_round_trip_for_percent() {
        for pct in 1..100u64 {
            let rendered = format!("{}", ParsedQuantity::Percent(pct));
            assert_eq!(
                parse_quantity(&rendered).unwrap(),
                ParsedQuantity::Percent(pct)
            );
        }
    }
}
