//! Sequential registration-number generation.
//!
//! A new student gets the successor of the highest number currently stored.
//! Generation is read-then-insert and therefore not safe under concurrent
//! approvals; the unique index on `registration_number` turns the race into
//! a duplicate-key conflict that the caller surfaces as 409 and may retry.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use mongodb::bson::doc;
use mongodb::Collection;
use regex::Regex;

use crate::models::student::Student;

lazy_static! {
    static ref FIXED_PATTERN: Regex = Regex::new(r"^\d{5}$").unwrap();
}

const FIXED_START: u64 = 10001;
const YEAR_SEQ_WIDTH: usize = 4;

/// Numbering scheme for registration numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberScheme {
    /// Plain 5-digit numbers starting at 10001
    Fixed,
    /// "STU{year}" prefix plus a 4-digit sequence starting at 1,
    /// e.g. "STU20250001"
    YearPrefixed(i32),
}

impl NumberScheme {
    /// Regex source matching numbers issued under this scheme, anchored
    pub fn pattern(&self) -> String {
        match self {
            NumberScheme::Fixed => r"^\d{5}$".to_string(),
            NumberScheme::YearPrefixed(year) => {
                format!(r"^STU{}\d{{{}}}$", year, YEAR_SEQ_WIDTH)
            }
        }
    }

    /// The number issued when the store holds none
    pub fn first(&self) -> String {
        match self {
            NumberScheme::Fixed => FIXED_START.to_string(),
            NumberScheme::YearPrefixed(year) => {
                format!("STU{}{:0width$}", year, 1, width = YEAR_SEQ_WIDTH)
            }
        }
    }

    /// Successor of `current`. Falls back to the scheme's first value when
    /// there is no current number or it does not parse.
    pub fn successor(&self, current: Option<&str>) -> String {
        let Some(current) = current else {
            return self.first();
        };

        match self {
            NumberScheme::Fixed => {
                if !FIXED_PATTERN.is_match(current) {
                    return self.first();
                }
                match current.parse::<u64>() {
                    Ok(n) => format!("{:05}", n + 1),
                    Err(_) => self.first(),
                }
            }
            NumberScheme::YearPrefixed(year) => {
                let prefix = format!("STU{}", year);
                let Some(suffix) = current.strip_prefix(&prefix) else {
                    return self.first();
                };
                if suffix.len() != YEAR_SEQ_WIDTH || !suffix.chars().all(|c| c.is_ascii_digit()) {
                    return self.first();
                }
                match suffix.parse::<u64>() {
                    Ok(n) => format!("STU{}{:0width$}", year, n + 1, width = YEAR_SEQ_WIDTH),
                    Err(_) => self.first(),
                }
            }
        }
    }
}

/// Parse a scheme name from configuration. `year` is the academic year used
/// by the prefixed scheme.
pub fn scheme_from_config(name: &str, year: i32) -> NumberScheme {
    match name {
        "year_prefixed" => NumberScheme::YearPrefixed(year),
        _ => NumberScheme::Fixed,
    }
}

/// Query the students collection for the highest number under the scheme and
/// return its successor. Fixed-width zero-padded numbers sort correctly as
/// strings, so a descending sort with limit 1 finds the maximum.
pub async fn next_registration_number(
    students: &Collection<Student>,
    scheme: NumberScheme,
) -> Result<String> {
    let current_max = students
        .find_one(doc! { "registration_number": { "$regex": scheme.pattern() } })
        .sort(doc! { "registration_number": -1 })
        .await
        .context("Failed to query highest registration number")?
        .map(|student| student.registration_number);

    Ok(scheme.successor(current_max.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_scheme_starts_at_10001() {
        assert_eq!(NumberScheme::Fixed.successor(None), "10001");
    }

    #[test]
    fn fixed_scheme_increments_and_pads() {
        assert_eq!(NumberScheme::Fixed.successor(Some("10001")), "10002");
        assert_eq!(NumberScheme::Fixed.successor(Some("10099")), "10100");
        assert_eq!(NumberScheme::Fixed.successor(Some("99998")), "99999");
    }

    #[test]
    fn fixed_scheme_falls_back_on_garbage() {
        assert_eq!(NumberScheme::Fixed.successor(Some("ABC12")), "10001");
        assert_eq!(NumberScheme::Fixed.successor(Some("123")), "10001");
        assert_eq!(NumberScheme::Fixed.successor(Some("")), "10001");
    }

    #[test]
    fn year_scheme_starts_at_one() {
        assert_eq!(
            NumberScheme::YearPrefixed(2025).successor(None),
            "STU20250001"
        );
    }

    #[test]
    fn year_scheme_increments_within_the_year() {
        let scheme = NumberScheme::YearPrefixed(2025);
        assert_eq!(scheme.successor(Some("STU20250001")), "STU20250002");
        assert_eq!(scheme.successor(Some("STU20250042")), "STU20250043");
        assert_eq!(scheme.successor(Some("STU20259999")), "STU202510000");
    }

    #[test]
    fn year_scheme_ignores_other_years() {
        let scheme = NumberScheme::YearPrefixed(2026);
        // a 2025 number does not belong to the 2026 sequence
        assert_eq!(scheme.successor(Some("STU20250042")), "STU20260001");
    }

    #[test]
    fn year_scheme_falls_back_on_garbage() {
        let scheme = NumberScheme::YearPrefixed(2025);
        assert_eq!(scheme.successor(Some("STU2025ABCD")), "STU20250001");
        assert_eq!(scheme.successor(Some("10001")), "STU20250001");
    }

    #[test]
    fn patterns_anchor_the_whole_string() {
        let fixed = Regex::new(&NumberScheme::Fixed.pattern()).unwrap();
        assert!(fixed.is_match("10001"));
        assert!(!fixed.is_match("100011"));
        assert!(!fixed.is_match("x10001"));

        let year = Regex::new(&NumberScheme::YearPrefixed(2025).pattern()).unwrap();
        assert!(year.is_match("STU20250001"));
        assert!(!year.is_match("STU2025001"));
        assert!(!year.is_match("STU20260001"));
    }

    #[test]
    fn scheme_selection_defaults_to_fixed() {
        assert_eq!(scheme_from_config("fixed", 2025), NumberScheme::Fixed);
        assert_eq!(scheme_from_config("unknown", 2025), NumberScheme::Fixed);
        assert_eq!(
            scheme_from_config("year_prefixed", 2025),
            NumberScheme::YearPrefixed(2025)
        );
    }
}
