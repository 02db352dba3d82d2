//! Minimum-probability threshold parsing.

use std::fmt;

use crate::error::ValidationError;

/// Minimum probability the top label needs for an image to count as a match.
///
/// Stored as a fraction in [0, 1]; entered by users as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MinProbability(f32);

impl MinProbability {
    /// Parse a user-entered percentage such as `"90"`, `"99.5"` or `"75 %"`.
    pub fn parse_percent(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidThreshold {
            input: raw.to_string(),
        };

        let trimmed = raw.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let percent: f32 = number.parse().map_err(|_| invalid())?;

        Self::from_percent(percent).ok_or_else(invalid)
    }

    /// Build from a percentage in [0, 100].
    pub fn from_percent(percent: f32) -> Option<Self> {
        if percent.is_finite() && (0.0..=100.0).contains(&percent) {
            Some(Self(percent / 100.0))
        } else {
            None
        }
    }

    /// Build from a fraction in [0, 1].
    pub fn from_fraction(fraction: f32) -> Option<Self> {
        if fraction.is_finite() && (0.0..=1.0).contains(&fraction) {
            Some(Self(fraction))
        } else {
            None
        }
    }

    /// The threshold as a fraction in [0, 1].
    pub fn fraction(self) -> f32 {
        self.0
    }

    /// Whether `probability` clears the threshold.
    pub fn accepts(self, probability: f32) -> bool {
        probability >= self.0
    }
}

impl fmt::Display for MinProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent_accepts_range() {
        assert_eq!(MinProbability::parse_percent("0").unwrap().fraction(), 0.0);
        assert_eq!(MinProbability::parse_percent("100").unwrap().fraction(), 1.0);
        assert_eq!(MinProbability::parse_percent(" 90 ").unwrap().fraction(), 0.9);
        assert_eq!(MinProbability::parse_percent("50%").unwrap().fraction(), 0.5);
    }

    #[test]
    fn test_parse_percent_rejects_out_of_range_and_garbage() {
        for raw in ["-1", "100.01", "abc", "", "NaN", "inf", "9 0"] {
            let err = MinProbability::parse_percent(raw).unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidThreshold {
                    input: raw.to_string()
                }
            );
        }
    }

    #[test]
    fn test_accepts_is_inclusive() {
        let threshold = MinProbability::from_fraction(0.9).unwrap();
        assert!(threshold.accepts(0.9));
        assert!(threshold.accepts(0.95));
        assert!(!threshold.accepts(0.89));
    }
}
