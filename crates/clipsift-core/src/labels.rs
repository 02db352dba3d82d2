//! Label parsing.
//!
//! The label text is what the user types: comma-separated free text such as
//! `"cat, dog, person riding a bike"`. Label order is significant because it
//! defines which entry of the backend's probability vector belongs to which
//! label.

use std::fmt;
use std::ops::Index;

use crate::error::ValidationError;

/// Ordered, non-empty list of classification targets.
///
/// Duplicates are kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Parse comma-separated label text.
    ///
    /// Tokens are trimmed and blank tokens dropped. Fails with
    /// [`ValidationError::EmptyLabelSet`] when nothing is left.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let labels: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();

        if labels.is_empty() {
            return Err(ValidationError::EmptyLabelSet);
        }

        Ok(Self { labels })
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a parsed set; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Iterate labels in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Borrow the labels as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

impl Index<usize> for LabelSet {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.labels[index]
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_keeps_order() {
        let labels = LabelSet::parse("  cat ,dog,  person riding a bike ").unwrap();
        assert_eq!(
            labels.as_slice(),
            &["cat", "dog", "person riding a bike"]
        );
    }

    #[test]
    fn test_parse_single_label() {
        let labels = LabelSet::parse("sunset").unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(&labels[0], "sunset");
    }

    #[test]
    fn test_parse_drops_blank_tokens() {
        let labels = LabelSet::parse(",cat,, ,dog,").unwrap();
        assert_eq!(labels.as_slice(), &["cat", "dog"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let labels = LabelSet::parse("cat, dog, cat").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(2), Some("cat"));
    }

    #[test]
    fn test_parse_rejects_blank_input() {
        for raw in ["", "   ", ",", " , ,, "] {
            assert_eq!(LabelSet::parse(raw), Err(ValidationError::EmptyLabelSet));
        }
    }

    #[test]
    fn test_display_joins_labels() {
        let labels = LabelSet::parse("a,b").unwrap();
        assert_eq!(labels.to_string(), "a, b");
    }
}
