//! Live GUI data catalog projection
//!
//! The catalog endpoint answers with `{"streams": [...]}`; a bare array of
//! entries is accepted as well.

use serde::Deserialize;

use crate::app::models::StreamRecord;
use crate::app::refdes::ReferenceDesignator;
use crate::constants::methods;
use crate::errors::{CatalogError, CatalogResult};

const CATALOG: &str = "live data catalog";

/// One stream entry as served by the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub stream_method: Option<String>,
    pub stream: Option<String>,
    pub reference_designator: Option<String>,
    pub array_name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Wrapped { streams: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl CatalogBody {
    fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            Self::Wrapped { streams } => streams,
            Self::Bare(entries) => entries,
        }
    }
}

/// Project the catalog response body into stream records
///
/// # Errors
///
/// Returns `CatalogError::SourceUnavailable` if the body is not a stream list
/// or an entry lacks a reference designator, and
/// `CatalogError::MalformedIdentifier` for a designator without four segments.
pub fn project_live_catalog(body: &str) -> CatalogResult<Vec<StreamRecord>> {
    let entries = serde_json::from_str::<CatalogBody>(body)
        .map_err(|e| CatalogError::unavailable(CATALOG, format!("unexpected response: {}", e)))?
        .into_entries();

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.into_record(i))
        .collect()
}

impl CatalogEntry {
    fn into_record(self, index: usize) -> CatalogResult<StreamRecord> {
        let refdes = self.reference_designator.ok_or_else(|| {
            CatalogError::unavailable(
                CATALOG,
                format!("entry {} has no reference_designator", index),
            )
        })?;
        let designator = ReferenceDesignator::parse(&refdes)?;

        Ok(StreamRecord {
            array_name: self.array_name,
            designator,
            method: normalize_method(self.stream_method.as_deref()),
            stream_name: self
                .stream
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| methods::NO_STREAM.to_string()),
            stream_type: None,
            in_qcdb: false,
            in_catalog: true,
            begin_time: self.start,
            end_time: self.end,
        })
    }
}

/// Catalog methods use hyphens (`recovered-host`); the QC Database uses
/// underscores
pub fn normalize_method(method: Option<&str>) -> String {
    match method.map(str::trim) {
        Some(m) if !m.is_empty() => m.replace('-', "_"),
        _ => methods::CATALOG_NO_METHOD.to_string(),
    }
}
