//! Reconciliation of the QC Database against the live catalog
//!
//! A full outer join of the two filtered record sets on their key columns.
//! Each joined row is then classified by which catalogs it was found in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::models::{ComparisonRow, StreamRecord, StreamSource};
use crate::errors::{CatalogError, CatalogResult};

/// Key columns the two sources are joined on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKeys {
    /// Array code, subsite, node, sensor, designator, method and stream
    #[default]
    Regional,
    /// Designator, method and stream only
    Reduced,
}

impl JoinKeys {
    /// Key columns for a record
    fn key(&self, record: &StreamRecord) -> Vec<String> {
        let d = &record.designator;
        let mut key = match self {
            Self::Regional => vec![
                d.array_code.clone(),
                d.subsite.clone(),
                d.node.clone(),
                d.sensor.clone(),
            ],
            Self::Reduced => Vec::with_capacity(3),
        };
        key.push(d.full.clone());
        key.push(record.method.clone());
        key.push(record.stream_name.clone());
        key
    }
}

/// Counts of each classification in a comparison table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonCounts {
    pub both: usize,
    pub qcdb_only: usize,
    pub catalog_only: usize,
}

impl ComparisonCounts {
    /// Tally a comparison table
    pub fn of(rows: &[ComparisonRow]) -> Self {
        rows.iter().fold(Self::default(), |mut counts, row| {
            match row.source {
                StreamSource::Both => counts.both += 1,
                StreamSource::QcDatabaseOnly => counts.qcdb_only += 1,
                StreamSource::CatalogOnly => counts.catalog_only += 1,
            }
            counts
        })
    }
}

/// Join the filtered QC Database rows with the filtered catalog rows
///
/// Rows sharing a key are merged: the QC Database contributes the stream
/// type and array name, the catalog contributes the availability window.
/// Duplicate keys multiply as in a relational join. The result is sorted by
/// designator, method and stream; the sort is stable.
///
/// # Errors
///
/// Returns `CatalogError::NoMatchingRecords` if `qcdb` is empty.
pub fn reconcile(
    qcdb: &[StreamRecord],
    catalog: &[StreamRecord],
    keys: JoinKeys,
) -> CatalogResult<Vec<ComparisonRow>> {
    if qcdb.is_empty() {
        return Err(CatalogError::NoMatchingRecords);
    }

    let mut catalog_index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, record) in catalog.iter().enumerate() {
        catalog_index.entry(keys.key(record)).or_default().push(i);
    }

    let mut matched = vec![false; catalog.len()];
    let mut joined = Vec::with_capacity(qcdb.len() + catalog.len());

    for a in qcdb {
        match catalog_index.get(&keys.key(a)) {
            Some(indices) => {
                for &i in indices {
                    matched[i] = true;
                    joined.push(merge(a, &catalog[i]));
                }
            }
            None => joined.push(a.clone()),
        }
    }

    joined.extend(
        catalog
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched[*i])
            .map(|(_, b)| b.clone()),
    );

    let mut rows: Vec<ComparisonRow> = joined.into_iter().filter_map(classify).collect();
    rows.sort_by(|x, y| x.record.sort_key().cmp(&y.record.sort_key()));

    let counts = ComparisonCounts::of(&rows);
    info!(
        "Reconciled {} rows: {} in both, {} QC Database only, {} catalog only",
        rows.len(),
        counts.both,
        counts.qcdb_only,
        counts.catalog_only
    );

    Ok(rows)
}

/// Merge a QC Database row with a catalog row sharing its key
fn merge(qcdb: &StreamRecord, catalog: &StreamRecord) -> StreamRecord {
    StreamRecord {
        array_name: qcdb.array_name.clone().or_else(|| catalog.array_name.clone()),
        designator: qcdb.designator.clone(),
        method: qcdb.method.clone(),
        stream_name: qcdb.stream_name.clone(),
        stream_type: qcdb.stream_type.clone(),
        in_qcdb: qcdb.in_qcdb || catalog.in_qcdb,
        in_catalog: qcdb.in_catalog || catalog.in_catalog,
        begin_time: catalog.begin_time.clone(),
        end_time: catalog.end_time.clone(),
    }
}

/// Tag a joined record with its source classification
pub fn classify(record: StreamRecord) -> Option<ComparisonRow> {
    match StreamSource::classify(record.in_qcdb, record.in_catalog) {
        Some(source) => Some(ComparisonRow { record, source }),
        None => {
            debug!("Dropping {} with no source flag", record.designator);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures::{catalog_record, qcdb_record};

    const BEGIN: &str = "2014-01-01T00:00:00.000Z";
    const END: &str = "2015-01-01T00:00:00.000Z";

    #[test]
    fn test_empty_qcdb_is_no_matching_records() {
        let catalog = vec![catalog_record(
            "GI01SUMO-SBD11-01-FLORTD000",
            "recovered_host",
            "flort_sample",
            BEGIN,
            END,
        )];
        assert!(matches!(
            reconcile(&[], &catalog, JoinKeys::Regional),
            Err(CatalogError::NoMatchingRecords)
        ));
    }

    #[test]
    fn test_matching_rows_merge_into_both() {
        let mut a = qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science");
        a.array_name = Some("Global Irminger Sea".to_string());
        let b = catalog_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", BEGIN, END);

        let rows = reconcile(&[a], &[b], JoinKeys::Regional).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.source, StreamSource::Both);
        assert_eq!(row.record.stream_type.as_deref(), Some("Science"));
        assert_eq!(row.record.array_name.as_deref(), Some("Global Irminger Sea"));
        assert_eq!(row.record.begin_time.as_deref(), Some(BEGIN));
        assert_eq!(row.record.end_time.as_deref(), Some(END));
        assert!(row.is_requestable());
    }

    #[test]
    fn test_disjoint_inputs_keep_every_row() {
        let a = vec![
            qcdb_record("CE02SHSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", "Science"),
            qcdb_record("CP01CNSM-MFD37-03-CTDBPD000", "recovered_inst", "ctdbp_cdef_instrument_recovered", "Science"),
        ];
        let b = vec![
            catalog_record("CE02SHSM-RID27-03-CTDBPC000", "recovered_host", "ctdbp_cdef_dcl_instrument_recovered", BEGIN, END),
            catalog_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", BEGIN, END),
            catalog_record("RS01SBPS-PC01A-4A-CTDPFA103", "streamed", "ctdpf_optode_sample", BEGIN, END),
        ];

        for keys in [JoinKeys::Regional, JoinKeys::Reduced] {
            let rows = reconcile(&a, &b, keys).unwrap();
            assert_eq!(rows.len(), a.len() + b.len());

            let counts = ComparisonCounts::of(&rows);
            assert_eq!(counts.both, 0);
            assert_eq!(counts.qcdb_only, 2);
            assert_eq!(counts.catalog_only, 3);
        }
    }

    #[test]
    fn test_duplicate_keys_multiply() {
        let a = vec![
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science"),
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Engineering"),
        ];
        let b = vec![
            catalog_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", BEGIN, END),
            catalog_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "2016-01-01T00:00:00.000Z", "2017-01-01T00:00:00.000Z"),
        ];

        let rows = reconcile(&a, &b, JoinKeys::Reduced).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.source == StreamSource::Both));
    }

    #[test]
    fn test_output_sorted_by_designator_method_stream() {
        let a = vec![
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "telemetered", "flort_sample", "Science"),
            qcdb_record("CE02SHSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", "Science"),
        ];
        let b = vec![
            catalog_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", BEGIN, END),
            catalog_record("CE02SHSM-RID27-03-CTDBPC000", "telemetered", "ctdbp_cdef_dcl_instrument", BEGIN, END),
        ];

        let rows = reconcile(&a, &b, JoinKeys::Regional).unwrap();
        let keys: Vec<(&str, &str, &str)> = rows.iter().map(|r| r.record.sort_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        assert_eq!(rows[0].source, StreamSource::Both);
        assert_eq!(rows[1].record.method, "recovered_host");
        assert_eq!(rows[1].source, StreamSource::CatalogOnly);
        assert_eq!(rows[2].source, StreamSource::QcDatabaseOnly);
    }

    #[test]
    fn test_empty_catalog_yields_all_qcdb_only() {
        let a = vec![qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science")];
        let rows = reconcile(&a, &[], JoinKeys::Regional).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, StreamSource::QcDatabaseOnly);
        assert_eq!(rows[0].record.begin_time, None);
    }
}
