//! Core application logic for OOI Requests
//!
//! This module contains the catalog loaders, the selection filter, the
//! reconciler, the request builder and the dispatcher, tied together by the
//! [`pipeline`] entry points.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ooi_requests::app::{compare, ClientConfig, OoiClient, PipelineConfig, PipelineOutcome, SourceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OoiClient::new(ClientConfig::default(), SourceConfig::default())?;
//! let config = PipelineConfig::default();
//!
//! match compare(&client, &config).await? {
//!     PipelineOutcome::Ready { paths, batch, .. } => {
//!         println!("{} requests written to {}", batch.len(), paths.request_urls.display());
//!     }
//!     PipelineOutcome::NoOverlap { comparison_path, .. } => {
//!         println!("Nothing to request, see {}", comparison_path.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod dispatch;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod refdes;
pub mod request;
pub mod selection;

// Re-export main public API
pub use catalog::{load_live_catalog, load_qc_database, CatalogSource, QcDatabaseTables};
pub use client::{ClientConfig, OoiClient, SourceConfig};
pub use dispatch::{
    DispatchConfig, DispatchOutcome, DispatchResponse, DispatchSummary, Dispatcher,
    RequestSender,
};
pub use models::{ComparisonRow, StreamRecord, StreamSource};
pub use output::OutputPaths;
pub use pipeline::{compare, send_requests, PipelineConfig, PipelineOutcome};
pub use reconcile::{reconcile, ComparisonCounts, JoinKeys};
pub use refdes::ReferenceDesignator;
pub use request::{build_requests, RequestBatch, RequestDescriptor, RequestSettings};
pub use selection::{
    define_methods, filter, DeliveryMethod, Level, SelectionCriteria, SelectionOptions,
    TimeBounds,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);

        let settings = RequestSettings::default();
        assert!(settings.include_annotations);
    }
}
