//! Numeric demands of recipe steps.
//!
//! A requirement string such as `"50"`, `">=150"`, `"≤3.2"` or `"2-4"` is
//! parsed into a [`Requirement`], an inclusive interval with optional
//! bounds, and compared against a capability's [`ParameterRange`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ParameterRange;

/// A parsed numeric demand: inclusive interval, either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// One violated side of a range comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeViolation {
    /// The capability cannot reach the demanded lower bound.
    BelowDemand {
        key: String,
        capability_max: f64,
        demand_min: f64,
    },
    /// The capability cannot go down to the demanded upper bound.
    AboveDemand {
        key: String,
        capability_min: f64,
        demand_max: f64,
    },
}

impl Requirement {
    /// Exact value (`low == high == value`).
    pub fn exact(value: f64) -> Self {
        Self {
            low: Some(value),
            high: Some(value),
        }
    }

    /// Closed interval `[low, high]`.
    pub fn between(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// Open upper side: `>= value`.
    pub fn at_least(value: f64) -> Self {
        Self {
            low: Some(value),
            high: None,
        }
    }

    /// Open lower side: `<= value`.
    pub fn at_most(value: f64) -> Self {
        Self {
            low: None,
            high: Some(value),
        }
    }

    /// Parses a requirement string.
    ///
    /// Accepted forms, with surrounding whitespace ignored:
    /// - `>=v`, `≥v`, `>v` → at least `v`
    /// - `<=v`, `≤v`, `<v` → at most `v`
    /// - `=v`, `v` → exactly `v`
    /// - `a-b` → between `a` and `b`
    ///
    /// Numbers are full float literals (`1.5`, `-2`, `1e3`, `2.5e-1`). A
    /// unit may follow a number after whitespace (`50 °C`). Strict
    /// comparisons are read as their inclusive forms. Returns `None` when
    /// the string is not one of these forms; a number is never truncated.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(rest) = strip_any(s, &[">=", "≥", "=>", ">"]) {
            return number(rest).map(Self::at_least);
        }
        if let Some(rest) = strip_any(s, &["<=", "≤", "=<", "<"]) {
            return number(rest).map(Self::at_most);
        }
        if let Some(rest) = s.strip_prefix('=') {
            return number(rest).map(Self::exact);
        }
        if let Some((low, high)) = range(s) {
            return Some(Self::between(low, high));
        }
        number(s).map(Self::exact)
    }

    /// Whether `value` lies inside the requirement.
    pub fn contains(&self, value: f64) -> bool {
        self.low.map_or(true, |lo| value >= lo) && self.high.map_or(true, |hi| value <= hi)
    }

    /// Compares the requirement against a capability range.
    ///
    /// Infeasible when the capability's high bound is below the demanded
    /// low bound, or its low bound exceeds the demanded high bound. A side
    /// is skipped when either bound involved is absent. Every violated side
    /// is returned.
    pub fn check(&self, key: &str, range: &ParameterRange) -> Vec<RangeViolation> {
        let mut violations = Vec::new();

        if let (Some(demand_min), Some(capability_max)) = (self.low, range.high) {
            if capability_max < demand_min {
                violations.push(RangeViolation::BelowDemand {
                    key: key.to_string(),
                    capability_max,
                    demand_min,
                });
            }
        }
        if let (Some(demand_max), Some(capability_min)) = (self.high, range.low) {
            if capability_min > demand_max {
                violations.push(RangeViolation::AboveDemand {
                    key: key.to_string(),
                    capability_min,
                    demand_max,
                });
            }
        }

        violations
    }
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeViolation::BelowDemand {
                key,
                capability_max,
                demand_min,
            } => write!(f, "{key}: max {capability_max} < demand {demand_min}"),
            RangeViolation::AboveDemand {
                key,
                capability_min,
                demand_max,
            } => write!(f, "{key}: min {capability_min} > demand {demand_max}"),
        }
    }
}

fn strip_any<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| s.strip_prefix(p))
}

/// Splits a float literal off the front of `s` (leading whitespace
/// skipped): optional sign, digits with an optional fraction, optional
/// exponent. Returns the value and the unread rest.
fn float_prefix(s: &str) -> Option<(f64, &str)> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        start + bytes[start.min(bytes.len())..].iter().take_while(|b| b.is_ascii_digit()).count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_start = end + 1 + sign;
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    let value = s[..end].parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some((value, &s[end..]))
}

/// A whole number token, optionally followed by whitespace and a single
/// unit token.
///
/// Anything glued to the number (`1,5`, `5x`, `5-`) makes it malformed.
fn number(s: &str) -> Option<f64> {
    let (value, rest) = float_prefix(s)?;
    if rest.is_empty() {
        return Some(value);
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let unit = rest.trim();
    if unit.contains(char::is_whitespace)
        || unit.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-'))
    {
        return None;
    }
    Some(value)
}

/// `low - high`. The separator is the first `-` after a complete low
/// literal, so exponent signs and a leading sign are never split on.
fn range(s: &str) -> Option<(f64, f64)> {
    let (low, rest) = float_prefix(s)?;
    let high = rest.trim_start().strip_prefix('-')?;
    Some((low, number(high)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Requirement::parse("≥5"), Some(Requirement::at_least(5.0)));
        assert_eq!(Requirement::parse(">=150"), Some(Requirement::at_least(150.0)));
        assert_eq!(Requirement::parse("≤3.2"), Some(Requirement::at_most(3.2)));
        assert_eq!(Requirement::parse("<= 8"), Some(Requirement::at_most(8.0)));
        assert_eq!(Requirement::parse("2-4"), Some(Requirement::between(2.0, 4.0)));
        assert_eq!(Requirement::parse("7"), Some(Requirement::exact(7.0)));
        assert_eq!(Requirement::parse(" =7 "), Some(Requirement::exact(7.0)));
    }

    #[test]
    fn test_parse_strict_operators_are_inclusive() {
        assert_eq!(Requirement::parse(">10"), Some(Requirement::at_least(10.0)));
        assert_eq!(Requirement::parse("<10"), Some(Requirement::at_most(10.0)));
    }

    #[test]
    fn test_parse_units_and_signs() {
        assert_eq!(Requirement::parse("50 °C"), Some(Requirement::exact(50.0)));
        assert_eq!(Requirement::parse("-5"), Some(Requirement::exact(-5.0)));
        assert_eq!(
            Requirement::parse("1.5 - 2.5"),
            Some(Requirement::between(1.5, 2.5))
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(Requirement::parse(""), None);
        assert_eq!(Requirement::parse("feed"), None);
        assert_eq!(Requirement::parse(">=abc"), None);
        assert_eq!(Requirement::parse("a-b"), None);
    }

    #[test]
    fn test_parse_exponents() {
        assert_eq!(Requirement::parse("1e3"), Some(Requirement::exact(1000.0)));
        assert_eq!(Requirement::parse("1e-3"), Some(Requirement::exact(0.001)));
        assert_eq!(Requirement::parse(">=2E+2"), Some(Requirement::at_least(200.0)));
        assert_eq!(
            Requirement::parse("2.5e1-3e1"),
            Some(Requirement::between(25.0, 30.0))
        );
        assert_eq!(Requirement::parse("-5--2"), Some(Requirement::between(-5.0, -2.0)));
    }

    #[test]
    fn test_parse_never_truncates() {
        assert_eq!(Requirement::parse("1,5"), None);
        assert_eq!(Requirement::parse("5x"), None);
        assert_eq!(Requirement::parse("5-"), None);
        assert_eq!(Requirement::parse("1.2.3"), None);
        assert_eq!(Requirement::parse("50 60"), None);
        assert_eq!(Requirement::parse("20 °C - 30 °C"), None);
        assert_eq!(Requirement::parse("1e999"), None);
    }

    #[test]
    fn test_exponent_demand_checked_at_full_value() {
        let range = ParameterRange::closed(0.0, 10.0);
        let v = Requirement::parse("1e3").unwrap().check("temp", &range);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].to_string(), "temp: max 10 < demand 1000");
    }

    #[test]
    fn test_exact_feasible_iff_inside_range() {
        let range = ParameterRange::new(Some(20.0), Some(100.0));
        for (v, feasible) in [(19.9, false), (20.0, true), (50.0, true), (100.0, true), (100.1, false)] {
            let violations = Requirement::exact(v).check("temp", &range);
            assert_eq!(violations.is_empty(), feasible, "value {v}");
        }
    }

    #[test]
    fn test_open_capability_bounds_are_unbounded() {
        let open_high = ParameterRange::new(Some(20.0), None);
        assert!(Requirement::exact(1e9).check("temp", &open_high).is_empty());
        assert!(!Requirement::exact(10.0).check("temp", &open_high).is_empty());

        let unbounded = ParameterRange::new(None, None);
        assert!(Requirement::exact(-1e9).check("temp", &unbounded).is_empty());
    }

    #[test]
    fn test_violation_messages() {
        let range = ParameterRange::new(Some(20.0), Some(100.0));
        let v = Requirement::at_least(150.0).check("temp", &range);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].to_string(), "temp: max 100 < demand 150");

        let v = Requirement::at_most(10.0).check("temp", &range);
        assert_eq!(v[0].to_string(), "temp: min 20 > demand 10");
    }

    #[test]
    fn test_inverted_capability_range_reports_both_sides() {
        // low > high is accepted at construction and surfaces here.
        let range = ParameterRange::new(Some(60.0), Some(40.0));
        let v = Requirement::exact(50.0).check("temp", &range);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_contains() {
        let r = Requirement::between(2.0, 4.0);
        assert!(r.contains(2.0));
        assert!(r.contains(4.0));
        assert!(!r.contains(4.5));
        assert!(Requirement::at_least(5.0).contains(1e12));
    }
}
