//! Data models for OOI Requests
//!
//! This module defines the row types shared by the catalog loader, the
//! selection filter and the reconciler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::refdes::ReferenceDesignator;

/// One (reference designator, delivery method, stream) row from either source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Region name for the array (e.g., "Global Irminger Sea")
    pub array_name: Option<String>,
    /// Decomposed reference designator
    pub designator: ReferenceDesignator,
    /// Delivery method (e.g., "recovered_host")
    pub method: String,
    /// Stream name (e.g., "flort_sample")
    pub stream_name: String,
    /// Stream category from the QC Database (e.g., "Science")
    pub stream_type: Option<String>,
    /// Present in the QC Database
    pub in_qcdb: bool,
    /// Present in the live GUI data catalog
    pub in_catalog: bool,
    /// First timestamp the data system holds for this stream
    pub begin_time: Option<String>,
    /// Last timestamp the data system holds for this stream
    pub end_time: Option<String>,
}

impl StreamRecord {
    /// Sort key of the comparison table
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.designator.full, &self.method, &self.stream_name)
    }

    /// Whether the QC Database classifies this stream as science data
    pub fn is_science(&self) -> bool {
        self.stream_type.as_deref() == Some(crate::constants::ooi::SCIENCE_STREAM_TYPE)
    }
}

/// Which catalogs a reconciled row was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamSource {
    /// Listed in the QC Database and the live catalog
    Both,
    /// Listed in the QC Database only
    QcDatabaseOnly,
    /// Listed in the live catalog only
    CatalogOnly,
}

impl StreamSource {
    /// Classify a row from its presence flags
    ///
    /// Returns `None` for a row present in neither source, which a join
    /// cannot produce.
    pub fn classify(in_qcdb: bool, in_catalog: bool) -> Option<Self> {
        match (in_qcdb, in_catalog) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::QcDatabaseOnly),
            (false, true) => Some(Self::CatalogOnly),
            (false, false) => None,
        }
    }

    /// Label written to the comparison snapshot
    pub fn label(&self) -> &'static str {
        match self {
            Self::Both => "qcdb_and_gui_catalog",
            Self::QcDatabaseOnly => "qcdb_only",
            Self::CatalogOnly => "gui_catalog_only",
        }
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reconciled row tagged with its source classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub record: StreamRecord,
    pub source: StreamSource,
}

impl ComparisonRow {
    /// Whether a data request should be built for this row
    pub fn is_requestable(&self) -> bool {
        self.source == StreamSource::Both && self.record.is_science()
    }
}
