//! Single entry point for a comparison run
//!
//! The pipeline loads the QC Database, validates and applies the selection,
//! loads the live catalog, reconciles the two and builds the data requests.
//! The comparison and request URL snapshots are written along the way.
//! Dispatching the requests is a separate step so callers can confirm first.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::catalog::{self, CatalogSource};
use crate::app::dispatch::{DispatchConfig, DispatchSummary, Dispatcher, RequestSender};
use crate::app::output::{self, OutputPaths};
use crate::app::reconcile::{reconcile, ComparisonCounts, JoinKeys};
use crate::app::request::{build_requests, RequestBatch, RequestSettings};
use crate::app::selection::{filter, validate_selection, SelectionCriteria, TimeBounds};
use crate::auth::Credentials;
use crate::constants::ooi;
use crate::errors::{CatalogError, Result};

/// Everything a comparison run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the run's CSV files are written to
    pub output_directory: PathBuf,
    /// API credentials, only needed for dispatch
    pub credentials: Option<Credentials>,
    pub selection_criteria: SelectionCriteria,
    pub time_bounds: TimeBounds,
    /// Join array names from the region table and compare on the full key
    pub enrich_regions: bool,
    /// Ask for annotations to be bundled with each export
    pub include_annotations: bool,
    /// M2M sensor inventory endpoint
    pub base_endpoint: String,
    /// Run stamp for file names; the current local time when unset
    pub run_stamp: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            credentials: None,
            selection_criteria: SelectionCriteria::default(),
            time_bounds: TimeBounds::default(),
            enrich_regions: true,
            include_annotations: true,
            base_endpoint: ooi::M2M_SENSOR_INV_URL.to_string(),
            run_stamp: None,
        }
    }
}

impl PipelineConfig {
    /// Request construction settings
    pub fn request_settings(&self) -> RequestSettings {
        RequestSettings {
            base_endpoint: self.base_endpoint.clone(),
            include_annotations: self.include_annotations,
        }
    }

    /// Output file paths for this run
    pub fn output_paths(&self) -> OutputPaths {
        let stamp = self.run_stamp.clone().unwrap_or_else(output::run_stamp);
        OutputPaths::new(&self.output_directory, &stamp)
    }

    fn join_keys(&self) -> JoinKeys {
        if self.enrich_regions {
            JoinKeys::Regional
        } else {
            JoinKeys::Reduced
        }
    }
}

/// How a comparison run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Streams common to both catalogs were found and requests were built
    Ready {
        paths: OutputPaths,
        counts: ComparisonCounts,
        batch: RequestBatch,
    },
    /// No stream is listed in both catalogs; only the comparison was written
    NoOverlap {
        comparison_path: PathBuf,
        counts: ComparisonCounts,
    },
}

impl PipelineOutcome {
    /// Classification counts of the comparison table
    pub fn counts(&self) -> ComparisonCounts {
        match self {
            Self::Ready { counts, .. } | Self::NoOverlap { counts, .. } => *counts,
        }
    }

    /// Path of the comparison snapshot
    pub fn comparison_path(&self) -> &Path {
        match self {
            Self::Ready { paths, .. } => &paths.comparison,
            Self::NoOverlap {
                comparison_path, ..
            } => comparison_path,
        }
    }
}

/// Compare the QC Database with the live catalog and build data requests
///
/// # Errors
///
/// - `SelectionError::InvalidTimeRange` for inconsistent bounds, before any fetch
/// - `SelectionError::InvalidSelectionValue` for a token not in the QC Database,
///   before the live catalog is fetched
/// - `CatalogError::NoMatchingRecords` if the selection matches nothing in the
///   QC Database
/// - `CatalogError::SourceUnavailable` or `MalformedIdentifier` from loading
/// - `OutputError` if a snapshot cannot be written
pub async fn compare<S: CatalogSource>(source: &S, config: &PipelineConfig) -> Result<PipelineOutcome> {
    let bounds = TimeBounds::new(config.time_bounds.begin_str(), config.time_bounds.end_str())?;
    let criteria = &config.selection_criteria;

    let qcdb = catalog::load_qc_database(source, config.enrich_regions).await?;
    validate_selection(&qcdb, criteria)?;

    let qcdb_selected = filter(&qcdb, criteria)?;
    if qcdb_selected.is_empty() {
        return Err(CatalogError::NoMatchingRecords.into());
    }
    info!("{} QC Database streams selected", qcdb_selected.len());

    let live = catalog::load_live_catalog(source).await?;
    let live_selected = filter(&live, criteria)?;
    info!("{} live catalog streams selected", live_selected.len());

    let rows = reconcile(&qcdb_selected, &live_selected, config.join_keys())?;
    let counts = ComparisonCounts::of(&rows);

    let paths = config.output_paths();
    output::write_comparison(&paths.comparison, &rows).await?;

    if live_selected.is_empty() || counts.both == 0 {
        warn!("No selected stream is listed in both the QC Database and the live catalog");
        return Ok(PipelineOutcome::NoOverlap {
            comparison_path: paths.comparison,
            counts,
        });
    }

    let batch = build_requests(&rows, &bounds, &config.request_settings());
    output::write_url_list(&paths.request_urls, &batch.urls()).await?;

    Ok(PipelineOutcome::Ready {
        paths,
        counts,
        batch,
    })
}

/// Send the URLs of a request list, recording outcomes next to it
///
/// # Errors
///
/// Returns an error if the ledger or checkpoint cannot be written.
pub async fn send_requests<R: RequestSender>(
    sender: R,
    urls: &[String],
    paths: &OutputPaths,
    dispatch: DispatchConfig,
) -> Result<DispatchSummary> {
    let dispatcher = Dispatcher::new(sender, dispatch);
    Ok(dispatcher.dispatch(urls, paths).await?)
}
