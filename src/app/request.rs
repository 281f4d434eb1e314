//! Data request construction
//!
//! Builds one asynchronous netCDF request per reconciled science stream,
//! with the user's time bounds clipped to the window the data system
//! advertises for that stream.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::form_urlencoded;

use crate::app::models::ComparisonRow;
use crate::app::refdes::ReferenceDesignator;
use crate::app::selection::TimeBounds;
use crate::constants::ooi;

/// Request endpoint and fixed query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// M2M sensor inventory endpoint, without trailing slash
    pub base_endpoint: String,
    /// Ask the data system to bundle annotations with the export
    pub include_annotations: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            base_endpoint: ooi::M2M_SENSOR_INV_URL.to_string(),
            include_annotations: true,
        }
    }
}

/// A fully resolved data request for one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub base_endpoint: String,
    pub designator: ReferenceDesignator,
    pub method: String,
    pub stream_name: String,
    pub begin: String,
    pub end: String,
    pub include_annotations: bool,
}

impl RequestDescriptor {
    /// Request URL
    ///
    /// `{base}/{subsite}/{node}/{sensor}/{method}/{stream}?beginDT=..&endDT=..`
    ///
    /// The bounds are form-encoded, so an offset such as `+00:00` is not
    /// read back as a space.
    pub fn url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("beginDT", &self.begin)
            .append_pair("endDT", &self.end)
            .finish();
        let mut url = format!(
            "{}/{}{}/{}?{}",
            self.base_endpoint.trim_end_matches('/'),
            self.designator.instrument_path(),
            self.method,
            self.stream_name,
            query
        );
        if self.include_annotations {
            url.push('&');
            url.push_str(ooi::INCLUDE_ANNOTATIONS_PARAM);
        }
        url
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Which bound a user value was requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Begin,
    End,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => f.write_str("begin"),
            Self::End => f.write_str("end"),
        }
    }
}

/// A user bound that fell outside the stream's window and was replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAdjustment {
    pub designator: String,
    pub method: String,
    pub stream_name: String,
    pub bound: Bound,
    pub requested: String,
    pub applied: String,
}

/// Requests built for a comparison table, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBatch {
    pub requests: Vec<RequestDescriptor>,
    pub adjustments: Vec<BoundAdjustment>,
}

impl RequestBatch {
    /// Request URLs in order
    pub fn urls(&self) -> Vec<String> {
        self.requests.iter().map(RequestDescriptor::url).collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Build a request for every row found in both catalogs with a science stream
///
/// A user begin is kept only if it lies strictly inside the stream's window;
/// a user end only if it is after the effective begin. Otherwise the stream's
/// own bound is used and an adjustment is recorded. Rows the catalog lists
/// without a start or end are skipped.
pub fn build_requests(
    rows: &[ComparisonRow],
    bounds: &TimeBounds,
    settings: &RequestSettings,
) -> RequestBatch {
    let mut batch = RequestBatch::default();

    for row in rows.iter().filter(|r| r.is_requestable()) {
        let record = &row.record;
        let window = (
            record.begin_time.as_deref().filter(|t| !t.is_empty()),
            record.end_time.as_deref().filter(|t| !t.is_empty()),
        );
        let (Some(system_begin), Some(system_end)) = window else {
            warn!(
                "{} {} {}: the live catalog gives no data range, skipping",
                record.designator, record.method, record.stream_name
            );
            continue;
        };

        let mut adjust = |bound: Bound, requested: &str, applied: &str| {
            warn!(
                "{} {} {}: requested {} {} is outside the available data, using {}",
                record.designator, record.method, record.stream_name, bound, requested, applied
            );
            batch.adjustments.push(BoundAdjustment {
                designator: record.designator.full.clone(),
                method: record.method.clone(),
                stream_name: record.stream_name.clone(),
                bound,
                requested: requested.to_string(),
                applied: applied.to_string(),
            });
        };

        let begin = match bounds.begin_str() {
            "" => system_begin,
            user if system_begin < user && user < system_end => user,
            user => {
                adjust(Bound::Begin, user, system_begin);
                system_begin
            }
        };

        let end = match bounds.end_str() {
            "" => system_end,
            user if user > begin => user,
            user => {
                adjust(Bound::End, user, system_end);
                system_end
            }
        };

        batch.requests.push(RequestDescriptor {
            base_endpoint: settings.base_endpoint.clone(),
            designator: record.designator.clone(),
            method: record.method.clone(),
            stream_name: record.stream_name.clone(),
            begin: begin.to_string(),
            end: end.to_string(),
            include_annotations: settings.include_annotations,
        });
    }

    info!(
        "Built {} data requests from {} comparison rows",
        batch.requests.len(),
        rows.len()
    );
    batch
}
