//! Enumeration and validation of legal selection values
//!
//! The legal values at each level are those present in the QC Database after
//! the upstream levels have been applied. Checking a selection against them
//! catches a typo before any catalog fetch, with an error naming the value.

use std::collections::BTreeSet;

use super::criteria::{Level, SelectionCriteria};
use super::filter::Predicate;
use super::methods::{define_methods, DeliveryMethod};
use crate::app::models::StreamRecord;
use crate::constants::methods;
use crate::errors::{SelectionError, SelectionResult};

/// Records remaining after the levels selected so far
#[derive(Debug, Clone)]
pub struct SelectionOptions<'a> {
    records: Vec<&'a StreamRecord>,
}

impl<'a> SelectionOptions<'a> {
    /// Start from every record
    pub fn new(records: &'a [StreamRecord]) -> Self {
        Self {
            records: records.iter().collect(),
        }
    }

    /// Number of records still selected
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    /// Sorted distinct legal values for a level
    ///
    /// Instruments are listed by their five-character class (e.g., "CTDBP").
    pub fn available(&self, level: Level) -> Vec<String> {
        if level == Level::DeliveryMethod {
            return methods::SELECTABLE.iter().map(|m| m.to_string()).collect();
        }

        let values: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| match level {
                Level::Instrument => r.designator.instrument_class(),
                _ => level.value(r),
            })
            .collect();
        values.into_iter().map(str::to_string).collect()
    }

    /// Validate the tokens for a level and narrow to the matching records
    ///
    /// Array, subsite and node tokens must be exact legal values. An
    /// instrument token must occur in at least one remaining sensor name.
    /// An empty token set leaves the records unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidSelectionValue` naming the level and
    /// the first offending token.
    pub fn select(self, level: Level, tokens: &BTreeSet<String>) -> SelectionResult<Self> {
        if tokens.is_empty() {
            return Ok(self);
        }

        let predicate = match level {
            Level::DeliveryMethod => {
                for token in tokens {
                    token.parse::<DeliveryMethod>()?;
                }
                Predicate::OneOf {
                    level,
                    values: define_methods(tokens)?,
                }
            }
            Level::Instrument => {
                for token in tokens {
                    let known = self
                        .records
                        .iter()
                        .any(|r| r.designator.sensor.contains(token.as_str()));
                    if !known {
                        return Err(self.invalid(level, token));
                    }
                }
                Predicate::Contains {
                    level,
                    tokens: tokens.clone(),
                }
            }
            _ => {
                let available = self.available(level);
                if let Some(token) = tokens.iter().find(|t| !available.contains(t)) {
                    return Err(self.invalid(level, token));
                }
                Predicate::Contains {
                    level,
                    tokens: tokens.clone(),
                }
            }
        };

        Ok(Self {
            records: self
                .records
                .into_iter()
                .filter(|r| predicate.matches(r))
                .collect(),
        })
    }

    /// Legal values at every level, each narrowed by the criteria upstream of it
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidSelectionValue` if an upstream token is
    /// not legal, since the levels below it cannot be enumerated.
    pub fn enumerate(
        records: &'a [StreamRecord],
        criteria: &SelectionCriteria,
    ) -> SelectionResult<Vec<(Level, Vec<String>)>> {
        let mut options = Self::new(records);
        let mut listing = Vec::with_capacity(Level::HIERARCHY.len() + 1);
        for level in Level::HIERARCHY {
            listing.push((level, options.available(level)));
            options = options.select(level, criteria.tokens(level))?;
        }
        listing.push((Level::DeliveryMethod, options.available(Level::DeliveryMethod)));
        Ok(listing)
    }

    fn invalid(&self, level: Level, token: &str) -> SelectionError {
        SelectionError::InvalidSelectionValue {
            level: level.name().to_string(),
            value: token.to_string(),
            available: self.available(level).join(", "),
        }
    }
}

/// Validate a whole selection against the legal values in `records`
///
/// Levels are checked in hierarchy order, each against the values left by
/// the levels before it, then the delivery methods.
///
/// # Errors
///
/// Returns `SelectionError::InvalidSelectionValue` for the first token that
/// is not a legal value at its level.
pub fn validate_selection(records: &[StreamRecord], criteria: &SelectionCriteria) -> SelectionResult<()> {
    let mut options = SelectionOptions::new(records);
    for level in Level::HIERARCHY {
        options = options.select(level, criteria.tokens(level))?;
    }
    options.select(Level::DeliveryMethod, criteria.tokens(Level::DeliveryMethod))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures::qcdb_record;
    use crate::app::selection::parse_tokens;

    fn records() -> Vec<StreamRecord> {
        vec![
            qcdb_record("CE02SHSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", "Science"),
            qcdb_record("CE04OSSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", "Science"),
            qcdb_record("CP01CNSM-MFD37-03-CTDBPD000", "recovered_inst", "ctdbp_cdef_instrument_recovered", "Science"),
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science"),
        ]
    }

    #[test]
    fn test_available_arrays_sorted() {
        let all = records();
        let options = SelectionOptions::new(&all);
        assert_eq!(options.available(Level::Array), vec!["CE", "CP", "GI"]);
    }

    #[test]
    fn test_available_narrows_with_upstream_selection() {
        let all = records();
        let options = SelectionOptions::new(&all)
            .select(Level::Array, &parse_tokens("CE"))
            .unwrap();

        assert_eq!(
            options.available(Level::Subsite),
            vec!["CE02SHSM", "CE04OSSM"]
        );
        assert_eq!(options.available(Level::Instrument), vec!["CTDBP"]);
    }

    #[test]
    fn test_enumerate_follows_criteria() {
        let all = records();
        let criteria = SelectionCriteria {
            arrays: parse_tokens("CP"),
            ..Default::default()
        };
        let listing = SelectionOptions::enumerate(&all, &criteria).unwrap();

        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0], (Level::Array, vec!["CE".to_string(), "CP".to_string(), "GI".to_string()]));
        assert_eq!(listing[1], (Level::Subsite, vec!["CP01CNSM".to_string()]));
        assert_eq!(listing[3], (Level::Instrument, vec!["CTDBP".to_string()]));
        assert_eq!(listing[4].1.len(), 3);
    }

    #[test]
    fn test_unknown_array_rejected() {
        let all = records();
        let criteria = SelectionCriteria {
            arrays: parse_tokens("ZZ"),
            ..Default::default()
        };

        match validate_selection(&all, &criteria) {
            Err(SelectionError::InvalidSelectionValue {
                level,
                value,
                available,
            }) => {
                assert_eq!(level, "array");
                assert_eq!(value, "ZZ");
                assert_eq!(available, "CE, CP, GI");
            }
            other => panic!("Expected InvalidSelectionValue, got {:?}", other),
        }
    }

    #[test]
    fn test_subsite_outside_selected_array_rejected() {
        let all = records();
        let criteria = SelectionCriteria {
            arrays: parse_tokens("CE"),
            subsites: parse_tokens("GI01SUMO"),
            ..Default::default()
        };

        assert!(matches!(
            validate_selection(&all, &criteria),
            Err(SelectionError::InvalidSelectionValue { ref level, .. }) if level == "subsite"
        ));
    }

    #[test]
    fn test_partial_instrument_accepted_when_present() {
        let all = records();
        let ok = SelectionCriteria {
            instruments: parse_tokens("FLOR,CTD"),
            ..Default::default()
        };
        assert!(validate_selection(&all, &ok).is_ok());

        let typo = SelectionCriteria {
            instruments: parse_tokens("FLRT"),
            ..Default::default()
        };
        assert!(validate_selection(&all, &typo).is_err());
    }

    #[test]
    fn test_invalid_delivery_method_rejected() {
        let all = records();
        let criteria = SelectionCriteria {
            delivery_methods: parse_tokens("recovered,downloaded"),
            ..Default::default()
        };

        assert!(matches!(
            validate_selection(&all, &criteria),
            Err(SelectionError::InvalidSelectionValue { ref value, .. }) if value == "downloaded"
        ));
    }

    #[test]
    fn test_select_empty_tokens_is_noop() {
        let all = records();
        let options = SelectionOptions::new(&all)
            .select(Level::Node, &BTreeSet::new())
            .unwrap();
        assert_eq!(options.remaining(), all.len());
    }
}
