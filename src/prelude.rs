//! Prelude module for OOI Requests
//!
//! Re-exports the items needed for a typical compare-then-send run with a
//! single `use ooi_requests::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ooi_requests::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = OoiClient::new(config.client_config(), config.source_config())?
//!         .with_credentials(load_credentials()?);
//!
//!     let pipeline = PipelineConfig {
//!         output_directory: config.output.directory.clone(),
//!         ..Default::default()
//!     };
//!     if let PipelineOutcome::Ready { paths, batch, .. } = compare(&client, &pipeline).await? {
//!         send_requests(&client, &batch.urls(), &paths, config.dispatch_config()).await?;
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Pipeline entry points and their inputs and outputs
pub use crate::app::{
    compare, send_requests, ClientConfig, ComparisonCounts, DispatchConfig, DispatchSummary,
    OoiClient, OutputPaths, PipelineConfig, PipelineOutcome, RequestBatch, SelectionCriteria,
    SourceConfig, TimeBounds,
};

// Seams for alternative sources and senders
pub use crate::app::{CatalogSource, RequestSender};

// Authentication functions
pub use crate::auth::{check_credentials, get_auth_status, load_credentials, AuthStatus, Credentials};

pub use crate::config::AppConfig;

pub use std::path::{Path, PathBuf};
