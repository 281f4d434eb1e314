//! QC Database projection
//!
//! The QC Database is published as three CSV tables: instrument streams,
//! stream descriptions and regions. The streams and descriptions are joined
//! on stream name, rows without a reference designator are dropped, and the
//! region table optionally supplies the array name.

use std::collections::HashMap;

use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app::models::StreamRecord;
use crate::app::refdes::ReferenceDesignator;
use crate::constants::methods;
use crate::errors::{CatalogError, CatalogResult};

const STREAMS_TABLE: &str = "QC Database streams";
const DESCRIPTIONS_TABLE: &str = "QC Database stream descriptions";
const REGIONS_TABLE: &str = "QC Database regions";

/// Raw CSV text of the QC Database tables
#[derive(Debug, Clone, Default)]
pub struct QcDatabaseTables {
    /// Instrument-stream table: `reference_designator, method, stream_name`
    pub streams_csv: String,
    /// Stream description table: `name, stream_type`
    pub descriptions_csv: String,
    /// Region table: `reference_designator, name` (array code and array name)
    pub regions_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamRow {
    reference_designator: Option<String>,
    method: Option<String>,
    stream_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescriptionRow {
    name: Option<String>,
    stream_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    reference_designator: Option<String>,
    name: Option<String>,
}

/// Project the QC Database tables into stream records
///
/// Every row is tagged as present in the QC Database. Rows whose delivery
/// method is blank get `no_method`. Input order of the stream table is kept.
///
/// # Errors
///
/// Returns `CatalogError::SourceUnavailable` if a table is missing a required
/// column or cannot be read, and `CatalogError::MalformedIdentifier` if a
/// reference designator does not have four segments.
pub fn project_qc_database(tables: &QcDatabaseTables) -> CatalogResult<Vec<StreamRecord>> {
    let descriptions = read_descriptions(&tables.descriptions_csv)?;
    let regions = match &tables.regions_csv {
        Some(csv_text) => Some(read_regions(csv_text)?),
        None => None,
    };

    let rows: Vec<StreamRow> = read_table(
        &tables.streams_csv,
        STREAMS_TABLE,
        &["reference_designator", "method", "stream_name"],
    )?;

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let Some(refdes) = non_blank(row.reference_designator) else {
            dropped += 1;
            continue;
        };
        let designator = ReferenceDesignator::parse(&refdes)?;
        let method = non_blank(row.method).unwrap_or_else(|| methods::NO_METHOD.to_string());
        let stream_name = non_blank(row.stream_name).unwrap_or_default();

        let array_name = regions
            .as_ref()
            .and_then(|r| r.get(&designator.array_code).cloned());

        let stream_types: Vec<Option<String>> = match descriptions.get(&stream_name) {
            Some(types) => types.clone(),
            None => vec![None],
        };

        for stream_type in stream_types {
            records.push(StreamRecord {
                array_name: array_name.clone(),
                designator: designator.clone(),
                method: method.clone(),
                stream_name: stream_name.clone(),
                stream_type,
                in_qcdb: true,
                in_catalog: false,
                begin_time: None,
                end_time: None,
            });
        }
    }

    if dropped > 0 {
        debug!("Dropped {} QC Database rows without a reference designator", dropped);
    }

    Ok(records)
}

/// Stream name to stream types; a name described twice joins twice
fn read_descriptions(csv_text: &str) -> CatalogResult<HashMap<String, Vec<Option<String>>>> {
    let rows: Vec<DescriptionRow> =
        read_table(csv_text, DESCRIPTIONS_TABLE, &["name", "stream_type"])?;

    let mut descriptions: HashMap<String, Vec<Option<String>>> = HashMap::new();
    for row in rows {
        if let Some(name) = non_blank(row.name) {
            descriptions
                .entry(name)
                .or_default()
                .push(non_blank(row.stream_type));
        }
    }
    Ok(descriptions)
}

/// Array code to array name
fn read_regions(csv_text: &str) -> CatalogResult<HashMap<String, String>> {
    let rows: Vec<RegionRow> =
        read_table(csv_text, REGIONS_TABLE, &["reference_designator", "name"])?;

    let mut regions = HashMap::new();
    for row in rows {
        if let (Some(code), Some(name)) = (non_blank(row.reference_designator), non_blank(row.name))
        {
            if regions.contains_key(&code) {
                warn!("Region {} listed more than once; keeping the first name", code);
                continue;
            }
            regions.insert(code, name);
        }
    }
    Ok(regions)
}

/// Deserialize a CSV table after checking its header has the named columns
fn read_table<T: for<'de> Deserialize<'de>>(
    csv_text: &str,
    table: &str,
    required: &[&str],
) -> CatalogResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::unavailable(table, e))?
        .clone();
    require_columns(&headers, table, required)?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| CatalogError::unavailable(table, format!("row {}: {}", i + 1, e)))
        })
        .collect()
}

fn require_columns(headers: &StringRecord, table: &str, required: &[&str]) -> CatalogResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::unavailable(
            table,
            format!("missing column(s): {}", missing.join(", ")),
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
