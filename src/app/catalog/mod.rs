//! Source catalog loading
//!
//! This module turns the two raw sources into `StreamRecord` rows:
//!
//! - [`qcdb`] - the QC Database, published as three CSV tables
//! - [`live`] - the live GUI data catalog, served as JSON
//!
//! Fetching is delegated to a [`CatalogSource`], so the projection logic can
//! be exercised without network access.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ooi_requests::app::{catalog, ClientConfig, OoiClient, SourceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OoiClient::new(ClientConfig::default(), SourceConfig::default())?;
//! let qcdb = catalog::load_qc_database(&client, true).await?;
//! println!("QC Database lists {} streams", qcdb.len());
//! # Ok(())
//! # }
//! ```

pub mod live;
pub mod qcdb;

use tracing::{debug, info};

use crate::app::models::StreamRecord;
use crate::errors::CatalogResult;

pub use live::{project_live_catalog, CatalogEntry};
pub use qcdb::{project_qc_database, QcDatabaseTables};

/// Provider of the raw source documents
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Fetch the QC Database tables
    ///
    /// The region table is only fetched when `include_regions` is set.
    async fn fetch_qc_database(&self, include_regions: bool) -> CatalogResult<QcDatabaseTables>;

    /// Fetch the live catalog response body
    async fn fetch_live_catalog(&self) -> CatalogResult<String>;
}

/// Fetch and project the QC Database
///
/// # Errors
///
/// Returns `CatalogError::SourceUnavailable` if a table cannot be fetched or
/// read, and `CatalogError::MalformedIdentifier` for a bad designator.
pub async fn load_qc_database<S: CatalogSource>(
    source: &S,
    enrich_regions: bool,
) -> CatalogResult<Vec<StreamRecord>> {
    debug!("Fetching QC Database tables (regions: {})", enrich_regions);
    let tables = source.fetch_qc_database(enrich_regions).await?;
    let records = project_qc_database(&tables)?;
    info!("QC Database lists {} streams", records.len());
    Ok(records)
}

/// Fetch and project the live catalog
///
/// # Errors
///
/// Returns `CatalogError::SourceUnavailable` if the catalog cannot be fetched
/// or parsed, and `CatalogError::MalformedIdentifier` for a bad designator.
pub async fn load_live_catalog<S: CatalogSource>(source: &S) -> CatalogResult<Vec<StreamRecord>> {
    debug!("Fetching live data catalog");
    let body = source.fetch_live_catalog().await?;
    let records = project_live_catalog(&body)?;
    info!("Live data catalog lists {} streams", records.len());
    Ok(records)
}

/// Source that serves QC Database tables fetched earlier
///
/// Lets the interactive prompt enumerate choices from the same tables the
/// pipeline then filters, without a second download. The live catalog is
/// always fetched from the wrapped source.
#[derive(Debug)]
pub struct Prefetched<'a, S> {
    inner: &'a S,
    tables: QcDatabaseTables,
    include_regions: bool,
}

impl<'a, S: CatalogSource> Prefetched<'a, S> {
    /// Fetch the QC Database tables once from `inner`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::SourceUnavailable` if a table cannot be fetched.
    pub async fn fetch(inner: &'a S, include_regions: bool) -> CatalogResult<Self> {
        let tables = inner.fetch_qc_database(include_regions).await?;
        Ok(Self {
            inner,
            tables,
            include_regions,
        })
    }

    /// Project the held tables into records
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a table is malformed.
    pub fn records(&self) -> CatalogResult<Vec<StreamRecord>> {
        project_qc_database(&self.tables)
    }
}

impl<S: CatalogSource> CatalogSource for Prefetched<'_, S> {
    async fn fetch_qc_database(&self, include_regions: bool) -> CatalogResult<QcDatabaseTables> {
        if include_regions && !self.include_regions {
            return self.inner.fetch_qc_database(true).await;
        }
        let mut tables = self.tables.clone();
        if !include_regions {
            tables.regions_csv = None;
        }
        Ok(tables)
    }

    async fn fetch_live_catalog(&self) -> CatalogResult<String> {
        self.inner.fetch_live_catalog().await
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemorySource;
    use super::*;
    use crate::errors::CatalogError;

    fn source() -> MemorySource {
        MemorySource {
            tables: QcDatabaseTables {
                streams_csv: "reference_designator,method,stream_name\n\
                              GI01SUMO-SBD11-01-FLORTD000,recovered_host,flort_sample\n"
                    .to_string(),
                descriptions_csv: "name,stream_type\nflort_sample,Science\n".to_string(),
                regions_csv: Some("reference_designator,name\nGI,Global Irminger Sea\n".to_string()),
            },
            catalog: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_qc_database_with_regions() {
        let records = load_qc_database(&source(), true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].array_name.as_deref(), Some("Global Irminger Sea"));
    }

    #[tokio::test]
    async fn test_load_qc_database_without_regions() {
        let records = load_qc_database(&source(), false).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].array_name, None);
    }

    #[tokio::test]
    async fn test_prefetched_serves_held_tables() {
        let inner = source();
        let prefetched = Prefetched::fetch(&inner, true).await.unwrap();
        assert_eq!(prefetched.records().unwrap().len(), 1);

        let records = load_qc_database(&prefetched, false).await.unwrap();
        assert_eq!(records[0].array_name, None);

        let result = load_live_catalog(&prefetched).await;
        assert!(result.is_err());
        assert_eq!(
            inner
                .catalog_fetches
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn test_load_live_catalog_unavailable() {
        let result = load_live_catalog(&source()).await;
        assert!(matches!(
            result,
            Err(CatalogError::SourceUnavailable { .. })
        ));
    }
}
