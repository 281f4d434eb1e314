//! Predicate-based selection filter
//!
//! A [`Filter`] is a list of independent [`Predicate`]s joined by logical
//! AND. Hierarchy levels match by substring containment so that partial
//! instrument names work; delivery methods match the expanded method set
//! exactly.

use std::collections::BTreeSet;

use tracing::debug;

use super::criteria::{Level, SelectionCriteria};
use super::methods::define_methods;
use crate::app::models::StreamRecord;
use crate::errors::SelectionResult;

/// A single pure test over a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The level's column contains at least one of the tokens
    Contains {
        level: Level,
        tokens: BTreeSet<String>,
    },
    /// The level's column equals one of the values
    OneOf {
        level: Level,
        values: BTreeSet<String>,
    },
}

impl Predicate {
    /// Test a record
    pub fn matches(&self, record: &StreamRecord) -> bool {
        match self {
            Self::Contains { level, tokens } => {
                let value = level.value(record);
                tokens.iter().any(|token| value.contains(token.as_str()))
            }
            Self::OneOf { level, values } => values.contains(level.value(record)),
        }
    }

    /// Level this predicate restricts
    pub fn level(&self) -> Level {
        match self {
            Self::Contains { level, .. } | Self::OneOf { level, .. } => *level,
        }
    }
}

/// Conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Build the filter for a selection
    ///
    /// Empty hierarchy levels add no predicate. The delivery method predicate
    /// is always present because an empty method selection expands to the
    /// default method set.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidSelectionValue` for an unknown
    /// delivery method.
    pub fn from_criteria(criteria: &SelectionCriteria) -> SelectionResult<Self> {
        let mut filter = Self::default();

        for level in Level::HIERARCHY {
            let tokens = criteria.tokens(level);
            if !tokens.is_empty() {
                filter = filter.and(Predicate::Contains {
                    level,
                    tokens: tokens.clone(),
                });
            }
        }

        Ok(filter.and(Predicate::OneOf {
            level: Level::DeliveryMethod,
            values: define_methods(&criteria.delivery_methods)?,
        }))
    }

    /// Add a predicate
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Predicates in application order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Test a record against every predicate
    pub fn matches(&self, record: &StreamRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Keep matching records, preserving input order
    pub fn apply(&self, records: &[StreamRecord]) -> Vec<StreamRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Filter records by a selection
///
/// # Errors
///
/// Returns `SelectionError::InvalidSelectionValue` for an unknown delivery
/// method.
pub fn filter(records: &[StreamRecord], criteria: &SelectionCriteria) -> SelectionResult<Vec<StreamRecord>> {
    let filtered = Filter::from_criteria(criteria)?.apply(records);
    debug!("Selection kept {} of {} records", filtered.len(), records.len());
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures::qcdb_record;
    use crate::app::selection::parse_tokens;

    fn records() -> Vec<StreamRecord> {
        vec![
            qcdb_record("CE02SHSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", "Science"),
            qcdb_record("CE02SHSM-RID27-03-CTDBPC000", "recovered_host", "ctdbp_cdef_dcl_instrument_recovered", "Science"),
            qcdb_record("CE02SHSM-RID27-02-FLORTD000", "telemetered", "flort_sample", "Science"),
            qcdb_record("CP01CNSM-MFD37-03-CTDBPD000", "recovered_inst", "ctdbp_cdef_instrument_recovered", "Science"),
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science"),
            qcdb_record("GI01SUMO-SBD11-06-METBKA000", "no_method", "metbk_hourly", "Science"),
            qcdb_record("RS01SBPS-PC01A-4A-CTDPFA103", "streamed", "ctdpf_optode_sample", "Science"),
        ]
    }

    fn criteria(arrays: &str, nodes: &str, instruments: &str, methods: &str) -> SelectionCriteria {
        SelectionCriteria {
            arrays: parse_tokens(arrays),
            nodes: parse_tokens(nodes),
            instruments: parse_tokens(instruments),
            delivery_methods: parse_tokens(methods),
            ..Default::default()
        }
    }

    fn refdes_methods(records: &[StreamRecord]) -> Vec<(String, String)> {
        records
            .iter()
            .map(|r| (r.designator.full.clone(), r.method.clone()))
            .collect()
    }

    #[test]
    fn test_unrestricted_keeps_every_default_method() {
        let all = records();
        let kept = filter(&all, &SelectionCriteria::default()).unwrap();
        assert_eq!(kept, all);
    }

    #[test]
    fn test_unknown_methods_excluded_when_unrestricted() {
        let mut all = records();
        all[0].method = "na".to_string();

        let kept = filter(&all, &SelectionCriteria::default()).unwrap();
        assert_eq!(kept.len(), all.len() - 1);
    }

    #[test]
    fn test_partial_instrument_match() {
        let kept = filter(&records(), &criteria("", "", "CTD", "")).unwrap();
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|r| r.designator.sensor.contains("CTD")));
    }

    #[test]
    fn test_levels_combine_conjunctively() {
        let kept = filter(&records(), &criteria("CE", "", "CTD", "recovered")).unwrap();
        assert_eq!(
            refdes_methods(&kept),
            vec![(
                "CE02SHSM-RID27-03-CTDBPC000".to_string(),
                "recovered_host".to_string()
            )]
        );
    }

    #[test]
    fn test_overlapping_tokens_do_not_duplicate_rows() {
        let kept = filter(&records(), &criteria("", "", "CTDBP,CTD", "")).unwrap();
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_unmatched_token_yields_empty_not_error() {
        let kept = filter(&records(), &criteria("", "SBD99", "", "")).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let c = criteria("CE,GI", "", "FLORT", "");
        let once = filter(&records(), &c).unwrap();
        let twice = filter(&once, &c).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_more_restrictive_criteria_is_subset() {
        let loose = criteria("CE,GI", "", "", "");
        let strict = criteria("CE,GI", "RID27", "", "telemetered");

        let loose_kept = filter(&records(), &loose).unwrap();
        let strict_kept = filter(&records(), &strict).unwrap();

        assert!(strict_kept.len() < loose_kept.len());
        assert!(strict_kept.iter().all(|r| loose_kept.contains(r)));
    }

    #[test]
    fn test_predicates_tested_independently() {
        let record = &records()[4];
        let array = Predicate::Contains {
            level: Level::Array,
            tokens: parse_tokens("GI"),
        };
        let method = Predicate::OneOf {
            level: Level::DeliveryMethod,
            values: parse_tokens("telemetered"),
        };

        assert!(array.matches(record));
        assert!(!method.matches(record));
        assert!(!Filter::default().and(array).and(method).matches(record));
    }

    #[test]
    fn test_filter_orders_levels() {
        let f = Filter::from_criteria(&criteria("CP", "MFD37", "", "")).unwrap();
        let levels: Vec<Level> = f.predicates().iter().map(|p| p.level()).collect();
        assert_eq!(
            levels,
            vec![Level::Array, Level::Node, Level::DeliveryMethod]
        );
    }
}
