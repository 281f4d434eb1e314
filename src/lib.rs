//! OOI Requests Library
//!
//! A Rust library for reconciling the OOI QC Database with the live data
//! catalog and sending bulk netCDF data requests for the streams both list.
//! Provides composable selection, atomic CSV snapshots and a resumable,
//! rate-limited dispatcher.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
