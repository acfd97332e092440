//! Free-text numeric answer evaluation.
//!
//! Parsing is deliberately forgiving: thousands separators, stray
//! whitespace, and `k/m/b/t` magnitude suffixes are all accepted.
//! Anything that still fails to parse grades as incorrect rather than
//! raising an error.

/// Relative tolerance applied when a numeric question does not specify one.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 0.5;

/// Acceptance rule for a numeric answer, selected per question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Bitwise numeric equality.
    Exact,
    /// Accept when the ratio of answer to target lies in [0.1, 10].
    OrderOfMagnitude,
    /// Accept when the relative error is at most this fraction.
    Relative(f64),
}

impl Tolerance {
    /// Check a parsed value against the target under this policy.
    ///
    /// A target of exactly 0 accepts only an answer of exactly 0, which
    /// also keeps the relative-error division away from a zero divisor.
    /// Both boundary ratios (0.1 and 10) and a relative error exactly at
    /// the tolerance fraction are accepted.
    #[must_use]
    pub fn accepts(self, value: f64, target: f64) -> bool {
        if target == 0.0 {
            return value == 0.0;
        }
        match self {
            Tolerance::Exact => value == target,
            Tolerance::OrderOfMagnitude => {
                let ratio = value / target;
                (0.1..=10.0).contains(&ratio)
            }
            Tolerance::Relative(fraction) => (value - target).abs() / target.abs() <= fraction,
        }
    }
}

/// Parse free-text numeric input.
///
/// Case-insensitive; strips whitespace and comma separators; recognizes a
/// trailing `k`, `m`, `b`, or `t` as x1e3, x1e6, x1e9, x1e12. Returns
/// `None` for anything that is not a finite number.
#[must_use]
pub fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned: String = text
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (mantissa, multiplier) = match cleaned.as_bytes()[cleaned.len() - 1] {
        b'k' => (&cleaned[..cleaned.len() - 1], 1e3),
        b'm' => (&cleaned[..cleaned.len() - 1], 1e6),
        b'b' => (&cleaned[..cleaned.len() - 1], 1e9),
        b't' => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned.as_str(), 1.0),
    };

    // reject the textual forms f64::from_str would otherwise accept
    if mantissa.is_empty() || mantissa.contains(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    mantissa
        .parse::<f64>()
        .ok()
        .map(|value| value * multiplier)
        .filter(|value| value.is_finite())
}

/// Parse `text` and check it against `target` under the question's policy.
///
/// An unspecified tolerance behaves as `Relative(0.5)`. Unparseable input
/// is always incorrect.
#[must_use]
pub fn check_answer(text: &str, target: f64, tolerance: Option<Tolerance>) -> bool {
    let policy = tolerance.unwrap_or(Tolerance::Relative(DEFAULT_RELATIVE_TOLERANCE));
    parse_numeric(text).is_some_and(|value| policy.accepts(value, target))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbers_and_separators() {
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric("  1,234,567 "), Some(1_234_567.0));
        assert_eq!(parse_numeric("-3.5"), Some(-3.5));
        assert_eq!(parse_numeric("1 000"), Some(1000.0));
    }

    #[test]
    fn parses_magnitude_suffixes_case_insensitively() {
        assert_eq!(parse_numeric("5K"), Some(5000.0));
        assert_eq!(parse_numeric("5k"), Some(5000.0));
        assert_eq!(parse_numeric("2.5m"), Some(2_500_000.0));
        assert_eq!(parse_numeric("1B"), Some(1e9));
        assert_eq!(parse_numeric("0.5t"), Some(5e11));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("k"), None);
        assert_eq!(parse_numeric("12x"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("nan"), None);
        assert_eq!(parse_numeric("1e999"), None);
    }

    #[test]
    fn exact_tolerance_requires_equality() {
        assert!(Tolerance::Exact.accepts(5.0, 5.0));
        assert!(!Tolerance::Exact.accepts(5.000001, 5.0));
    }

    #[test]
    fn order_of_magnitude_boundaries_are_inclusive() {
        assert!(Tolerance::OrderOfMagnitude.accepts(1.0, 10.0)); // ratio exactly 0.1
        assert!(Tolerance::OrderOfMagnitude.accepts(100.0, 10.0)); // ratio exactly 10
        assert!(!Tolerance::OrderOfMagnitude.accepts(0.9, 10.0));
        assert!(!Tolerance::OrderOfMagnitude.accepts(101.0, 10.0));
    }

    #[test]
    fn relative_tolerance_boundary_is_inclusive() {
        assert!(Tolerance::Relative(0.1).accepts(110.0, 100.0));
        assert!(!Tolerance::Relative(0.1).accepts(110.1, 100.0));
        // negative targets use the magnitude of the target
        assert!(Tolerance::Relative(0.1).accepts(-95.0, -100.0));
    }

    #[test]
    fn zero_target_bypasses_relative_error() {
        assert!(Tolerance::Relative(0.5).accepts(0.0, 0.0));
        assert!(!Tolerance::Relative(0.5).accepts(0.0001, 0.0));
        assert!(Tolerance::OrderOfMagnitude.accepts(0.0, 0.0));
        assert!(!Tolerance::Exact.accepts(1.0, 0.0));
    }

    #[test]
    fn unspecified_tolerance_defaults_to_fifty_percent() {
        assert!(check_answer("149", 100.0, None));
        assert!(check_answer("150", 100.0, None)); // boundary inclusive
        assert!(!check_answer("151", 100.0, None));
    }

    #[test]
    fn suffixed_input_checks_against_target() {
        assert!(check_answer("5K", 5000.0, Some(Tolerance::Relative(0.01))));
        assert!(!check_answer("5K", 6000.0, Some(Tolerance::Relative(0.01))));
        assert!(!check_answer("five", 5.0, Some(Tolerance::Exact)));
    }
}
