//! Command-line argument parsing for OOI Requests
//!
//! This module defines the CLI structure using clap derive macros: catalog
//! comparison, request dispatch, credential management and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::selection::{parse_tokens, SelectionCriteria, TimeBounds};
use crate::errors::SelectionResult;

/// OOI Requests - build and send bulk OOI netCDF data requests
#[derive(Parser, Debug)]
#[command(
    name = "ooi_requests",
    version,
    about = "Reconcile the OOI QC Database with the live data catalog and request netCDF files",
    long_about = "Compares the streams listed in the OOI QC Database with those in the live data catalog,
builds one M2M data request per stream common to both, and sends the requests with automatic
resend while the data system is not ready."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare the catalogs and write the request URL file
    Compare(CompareArgs),

    /// Send the requests listed in a URL file
    Send(SendArgs),

    /// Compare the catalogs, then send the requests
    Run(RunArgs),

    /// Manage OOI API credentials
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the compare command
#[derive(Args, Debug, Clone, Default)]
pub struct CompareArgs {
    /// Arrays to select, comma separated (e.g., "CE,GI")
    #[arg(short, long, value_name = "LIST")]
    pub arrays: Option<String>,

    /// Subsites to select (e.g., "CE02SHSM")
    #[arg(short, long, value_name = "LIST")]
    pub subsites: Option<String>,

    /// Nodes to select (e.g., "RID27")
    #[arg(short, long, value_name = "LIST")]
    pub nodes: Option<String>,

    /// Full or partial instrument names (e.g., "CTDBP,03-DOSTAD000")
    #[arg(short, long, value_name = "LIST")]
    pub instruments: Option<String>,

    /// Delivery methods: streamed, telemetered, recovered
    #[arg(short, long, value_name = "LIST")]
    pub methods: Option<String>,

    /// Choose the selection level by level at prompts
    #[arg(long)]
    pub interactive: bool,

    /// Request data from this time on (e.g., 2014-01-01T00:00:00.000Z)
    #[arg(long, value_name = "TIME")]
    pub begin: Option<String>,

    /// Request data up to this time
    #[arg(long, value_name = "TIME")]
    pub end: Option<String>,

    /// Compare without the region table
    #[arg(long)]
    pub no_regions: bool,

    /// Do not bundle annotations with the data
    #[arg(long)]
    pub no_annotations: bool,

    /// Directory for the output CSV files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the send command
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// File of request URLs, one per line
    #[arg(short, long, value_name = "FILE")]
    pub urls: PathBuf,

    /// Send without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Directory for the summary files; defaults to the URL file's directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub compare: CompareArgs,

    /// Send without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Set up OOI API credentials
    Setup {
        /// Force setup even if credentials exist
        #[arg(short, long)]
        force: bool,
    },

    /// Show authentication status
    Status,

    /// Clear stored credentials
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Where to write the file
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration in effect
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// Returns `None` when no flag was given, leaving the level to the
    /// configuration file.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl CompareArgs {
    /// Selection criteria from the selection flags
    pub fn criteria(&self) -> SelectionCriteria {
        let tokens = |flag: &Option<String>| flag.as_deref().map(parse_tokens).unwrap_or_default();
        SelectionCriteria {
            arrays: tokens(&self.arrays),
            subsites: tokens(&self.subsites),
            nodes: tokens(&self.nodes),
            instruments: tokens(&self.instruments),
            delivery_methods: tokens(&self.methods),
        }
    }

    /// Validated time bounds from `--begin` and `--end`
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidTimeRange` for a begin later than
    /// the end.
    pub fn time_bounds(&self) -> SelectionResult<TimeBounds> {
        TimeBounds::new(
            self.begin.as_deref().unwrap_or(""),
            self.end.as_deref().unwrap_or(""),
        )
    }

    /// Whether any selection flag was given
    pub fn has_selection(&self) -> bool {
        !self.criteria().is_unrestricted()
    }
}
