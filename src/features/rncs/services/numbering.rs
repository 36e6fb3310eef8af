//! `YYYY-NNN` RNC numbers: calendar year plus a per-year sequence.

use std::time::Duration;

use crate::shared::validation::RNC_NUMBER_REGEX;

/// Attempts to allocate a free number before giving up
pub const MAX_ALLOCATION_ATTEMPTS: usize = 20;

/// Pause between allocation attempts after losing a race
pub const ALLOCATION_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Highest sequence a year can reach (nine digits)
pub const MAX_SEQUENCE: i64 = 999_999_999;

/// Sequence is zero-padded to three digits and grows past 999 unpadded
pub fn format_rnc_number(year: i32, sequence: i64) -> String {
    format!("{}-{:03}", year, sequence)
}

/// Split a well-formed number into `(year, sequence)`
pub fn parse_rnc_number(value: &str) -> Option<(i32, i64)> {
    let caps = RNC_NUMBER_REGEX.captures(value.trim())?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let sequence = caps.get(2)?.as_str().parse().ok()?;
    Some((year, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_rnc_number(2026, 1), "2026-001");
        assert_eq!(format_rnc_number(2026, 42), "2026-042");
        assert_eq!(format_rnc_number(2026, 1234), "2026-1234");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_rnc_number("2025-017"), Some((2025, 17)));
        assert_eq!(parse_rnc_number(" 2025-1000 "), Some((2025, 1000)));
        assert_eq!(parse_rnc_number("2025-17"), None);
        assert_eq!(parse_rnc_number("RNC-001"), None);
        assert_eq!(parse_rnc_number("2025-999999999"), Some((2025, 999_999_999)));
        assert_eq!(parse_rnc_number("2025-9223372036854775807"), None);
    }
}
