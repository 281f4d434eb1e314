//! Error types for OOI Requests
//!
//! This module defines the error types for all components of the application.
//! Errors are designed to be actionable and name the offending value so that
//! a failed run leaves a human-readable explanation.

use std::path::PathBuf;
use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing environment variables for credentials
    #[error(
        "Missing OOI credentials. Set OOI_USERNAME and OOI_TOKEN environment variables or run 'auth setup'"
    )]
    MissingCredentials,

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Invalid username format
    #[error("Invalid username format: {reason}")]
    InvalidUsername { reason: String },

    /// Empty API token
    #[error("API token cannot be empty")]
    EmptyToken,

    /// File I/O error during credential storage
    #[error("Failed to save credentials to file")]
    CredentialStorage(#[from] std::io::Error),
}

/// Reference designator and source catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Reference designator does not split into four segments
    #[error(
        "Malformed reference designator '{refdes}': expected 4 hyphen-delimited segments, found {segments}"
    )]
    MalformedIdentifier { refdes: String, segments: usize },

    /// A source could not be fetched or had an unexpected shape
    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// HTTP request error while fetching a source
    #[error("HTTP request failed while fetching {source_name}")]
    Http {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },

    /// The QC Database has no rows for the selection
    #[error("The selected instruments/delivery methods are not found in the QC Database")]
    NoMatchingRecords,
}

impl CatalogError {
    /// Build a `SourceUnavailable` error
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Selection criteria errors
#[derive(Error, Debug)]
pub enum SelectionError {
    /// A user token is not a legal value at its level
    #[error("Selected {level} ({value}) not found in QC Database. Please choose from: {available}")]
    InvalidSelectionValue {
        level: String,
        value: String,
        available: String,
    },

    /// Begin/end bounds are inconsistent or unparseable
    #[error("Invalid time range: {reason}")]
    InvalidTimeRange { reason: String },
}

/// Request dispatch errors
#[derive(Error, Debug)]
pub enum DispatchError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Missing credentials for authenticated requests
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Ledger or checkpoint write failed
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Output snapshot errors
#[derive(Error, Debug)]
pub enum OutputError {
    /// I/O error during file operations
    #[error("File I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// CSV encoding or decoding error
    #[error("CSV error on {path}")]
    Csv {
        path: PathBuf,
        #[source]
        error: csv::Error,
    },

    /// Atomic rename failed
    #[error("Atomic file operation failed: could not persist {final_path}")]
    AtomicOperationFailed { final_path: PathBuf },
}

impl OutputError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Wrap a CSV error with the path it occurred on
    pub fn csv(path: impl Into<PathBuf>, error: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            error,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Selection error
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Dispatch error
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Output error
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Dispatch(DispatchError::Http(_))
                | AppError::Dispatch(DispatchError::RateLimitExceeded)
                | AppError::Dispatch(DispatchError::ServerOverloaded)
                | AppError::Catalog(CatalogError::Http { .. })
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Catalog(CatalogError::MalformedIdentifier { .. }) => "identifier",
            AppError::Catalog(_) => "catalog",
            AppError::Selection(_) => "selection",
            AppError::Dispatch(_) => "dispatch",
            AppError::Output(_) => "output",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Selection result type alias
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

/// Dispatch result type alias
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Output result type alias
pub type OutputResult<T> = std::result::Result<T, OutputError>;
