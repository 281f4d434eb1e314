//! Selection criteria and time bounds

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::models::StreamRecord;
use crate::errors::{SelectionError, SelectionResult};

/// Hierarchy level a selection token applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Array,
    Subsite,
    Node,
    Instrument,
    DeliveryMethod,
}

impl Level {
    /// Hierarchy levels in narrowing order
    pub const HIERARCHY: [Level; 4] = [Level::Array, Level::Subsite, Level::Node, Level::Instrument];

    /// Name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Subsite => "subsite",
            Self::Node => "node",
            Self::Instrument => "instrument",
            Self::DeliveryMethod => "delivery_method",
        }
    }

    /// Column of a record this level matches against
    pub fn value<'a>(&self, record: &'a StreamRecord) -> &'a str {
        match self {
            Self::Array => &record.designator.array_code,
            Self::Subsite => &record.designator.subsite,
            Self::Node => &record.designator.node,
            Self::Instrument => &record.designator.sensor,
            Self::DeliveryMethod => &record.method,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User selection across the hierarchy levels
///
/// An empty set means "no restriction at this level". It is not a wildcard
/// token: a non-empty set that matches nothing selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub arrays: BTreeSet<String>,
    pub subsites: BTreeSet<String>,
    pub nodes: BTreeSet<String>,
    /// Full or partial sensor names (e.g., "CTD" or "03-CTDBPF000")
    pub instruments: BTreeSet<String>,
    /// Abstract delivery methods: streamed, telemetered, recovered
    pub delivery_methods: BTreeSet<String>,
}

impl SelectionCriteria {
    /// Tokens supplied for a level
    pub fn tokens(&self, level: Level) -> &BTreeSet<String> {
        match level {
            Level::Array => &self.arrays,
            Level::Subsite => &self.subsites,
            Level::Node => &self.nodes,
            Level::Instrument => &self.instruments,
            Level::DeliveryMethod => &self.delivery_methods,
        }
    }

    /// Replace the tokens for a level
    pub fn set_tokens(&mut self, level: Level, tokens: BTreeSet<String>) {
        let slot = match level {
            Level::Array => &mut self.arrays,
            Level::Subsite => &mut self.subsites,
            Level::Node => &mut self.nodes,
            Level::Instrument => &mut self.instruments,
            Level::DeliveryMethod => &mut self.delivery_methods,
        };
        *slot = tokens;
    }

    /// Whether no level is restricted
    pub fn is_unrestricted(&self) -> bool {
        Level::HIERARCHY
            .iter()
            .chain(std::iter::once(&Level::DeliveryMethod))
            .all(|level| self.tokens(*level).is_empty())
    }
}

/// Parse comma-separated user input into a token set
///
/// Whitespace is removed; empty input yields an empty set.
pub fn parse_tokens(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(|token| token.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Requested begin and end of the data, each optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub begin: Option<String>,
    pub end: Option<String>,
}

impl TimeBounds {
    /// Build bounds from user input; blank strings mean "no bound"
    ///
    /// Bounds are kept as entered (trimmed) and compared as strings, the
    /// same ordering used when they are intersected with a stream's range.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidTimeRange` if begin is later than end.
    pub fn new(begin: &str, end: &str) -> SelectionResult<Self> {
        let begin = Self::bound(begin);
        let end = Self::bound(end);

        if let (Some(b), Some(e)) = (&begin, &end) {
            if b > e {
                return Err(SelectionError::InvalidTimeRange {
                    reason: format!("begin date entered ({}) is after end date ({})", b, e),
                });
            }
        }

        Ok(Self { begin, end })
    }

    fn bound(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Begin bound, empty when unset
    pub fn begin_str(&self) -> &str {
        self.begin.as_deref().unwrap_or("")
    }

    /// End bound, empty when unset
    pub fn end_str(&self) -> &str {
        self.end.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert!(parse_tokens("").is_empty());
        assert!(parse_tokens(" , ").is_empty());

        let tokens = parse_tokens("CP, CE ,GI");
        assert_eq!(
            tokens.into_iter().collect::<Vec<_>>(),
            vec!["CE", "CP", "GI"]
        );

        let single = parse_tokens("03-CTDBPF000");
        assert!(single.contains("03-CTDBPF000"));
    }

    #[test]
    fn test_empty_criteria_is_unrestricted() {
        let mut criteria = SelectionCriteria::default();
        assert!(criteria.is_unrestricted());

        criteria.delivery_methods.insert("streamed".to_string());
        assert!(!criteria.is_unrestricted());
    }

    #[test]
    fn test_time_bounds_accepts_blank() {
        let bounds = TimeBounds::new("", "  ").unwrap();
        assert_eq!(bounds, TimeBounds::default());
        assert_eq!(bounds.begin_str(), "");
    }

    #[test]
    fn test_time_bounds_one_sided() {
        let bounds = TimeBounds::new("2014-05-15T00:00:00.000Z", "").unwrap();
        assert_eq!(bounds.begin.as_deref(), Some("2014-05-15T00:00:00.000Z"));
        assert_eq!(bounds.end, None);
    }

    #[test]
    fn test_time_bounds_rejects_inverted_range() {
        let result = TimeBounds::new("2015-01-01T00:00:00.000Z", "2014-01-01T00:00:00.000Z");
        match result {
            Err(SelectionError::InvalidTimeRange { reason }) => {
                assert!(reason.contains("after end date"));
            }
            other => panic!("Expected InvalidTimeRange, got {:?}", other),
        }
    }

    #[test]
    fn test_time_bounds_accept_date_only() {
        let bounds = TimeBounds::new("2015-06-01", "").unwrap();
        assert_eq!(bounds.begin.as_deref(), Some("2015-06-01"));
        assert_eq!(bounds.end, None);

        let bounds = TimeBounds::new(" 2015-06-01 ", "2016-01-01T00:00:00.000Z").unwrap();
        assert_eq!(bounds.begin_str(), "2015-06-01");
        assert_eq!(bounds.end_str(), "2016-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_time_bounds_compare_as_text() {
        assert!(TimeBounds::new("2016-01-01", "2015-12-31T23:59:59.999Z").is_err());
        assert!(TimeBounds::new("2015-12-31", "2015-12-31T00:00:00.000Z").is_ok());
    }
}
