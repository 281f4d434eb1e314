//! Application constants for OOI Requests
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the OOI API username
    pub const USERNAME: &str = "OOI_USERNAME";

    /// Environment variable name for the OOI API token
    pub const TOKEN: &str = "OOI_TOKEN";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Minimum allowed username length
    pub const MIN_USERNAME_LENGTH: usize = 3;

    /// Maximum allowed username length
    pub const MAX_USERNAME_LENGTH: usize = 64;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "OOI-Requests/0.1.0 (Ocean Data Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Rate limiting and retry configuration
pub mod limits {
    use super::Duration;

    /// Default rate limit for OOI requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for transport failures
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Fixed wait before resending a request the data system is not ready for
    pub const NOT_READY_RETRY_INTERVAL: Duration = Duration::from_secs(60);
}

/// OOI service URLs and endpoints
pub mod ooi {
    /// Live GUI data catalog endpoint
    pub const CATALOG_URL: &str = "https://ooinet.oceanobservatories.org/api/uframe/stream";

    /// M2M sensor inventory endpoint used as the base of data requests
    pub const M2M_SENSOR_INV_URL: &str =
        "https://ooinet.oceanobservatories.org/api/m2m/12576/sensor/inv";

    /// QC Database instrument-stream table
    pub const QCDB_STREAMS_URL: &str = "https://raw.githubusercontent.com/seagrinch/data-team-python/master/infrastructure/data_streams.csv";

    /// QC Database stream description table
    pub const QCDB_STREAM_DESCRIPTIONS_URL: &str = "https://raw.githubusercontent.com/seagrinch/data-team-python/master/infrastructure/stream_descriptions.csv";

    /// QC Database region table
    pub const QCDB_REGIONS_URL: &str = "https://raw.githubusercontent.com/seagrinch/data-team-python/master/infrastructure/regions.csv";

    /// Stream type that is eligible for data requests
    pub const SCIENCE_STREAM_TYPE: &str = "Science";

    /// Query parameter asking the data system to bundle annotations
    pub const INCLUDE_ANNOTATIONS_PARAM: &str = "include_annotations=true";
}

/// Delivery method tokens
pub mod methods {
    /// Method recorded for QC Database rows without a delivery method
    pub const NO_METHOD: &str = "no_method";

    /// Method recorded for catalog entries without a delivery method
    pub const CATALOG_NO_METHOD: &str = "na";

    /// Stream recorded for catalog entries without a stream name
    pub const NO_STREAM: &str = "no_stream";

    /// Methods a user may select
    pub const SELECTABLE: [&str; 3] = ["streamed", "telemetered", "recovered"];

    /// Concrete methods the abstract "recovered" method fans out to
    pub const RECOVERED_FAN_OUT: [&str; 4] = [
        "recovered_host",
        "recovered_inst",
        "recovered_wfp",
        "recovered_cspp",
    ];
}

/// Dispatch status and sentinel values
pub mod dispatch {
    /// Output URL recorded when the data system returns none
    pub const NO_OUTPUT_URL: &str = "no_output_url";

    /// Status recorded for a successful request without an explicit status
    pub const DEFAULT_SUCCESS_STATUS: &str = "Data available for request";

    /// Status recorded for a failed request without an explicit status
    pub const DEFAULT_FAILURE_STATUS: &str = "Data request failed: no uFrame status provided";

    /// Checkpoint content once every request has been attempted
    pub const ALL_ATTEMPTED: &str = "Attempted to send all requests";
}

/// File operation constants
pub mod files {
    /// Prefix of the reconciliation snapshot
    pub const COMPARISON_PREFIX: &str = "compare_qcdb_gui_catalog";

    /// Prefix of the request URL list
    pub const REQUEST_URLS_PREFIX: &str = "data_request_urls";

    /// Prefix of the dispatch ledger
    pub const SUMMARY_PREFIX: &str = "data_request_summary";

    /// Prefix of the remaining-URLs checkpoint
    pub const NOT_SENT_PREFIX: &str = "urls_not_sent";

    /// Run stamp format used in output file names
    pub const RUN_STAMP_FORMAT: &str = "%Y%m%dT%H%M";
}

/// Logging and debugging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use env::{TOKEN as ENV_TOKEN, USERNAME as ENV_USERNAME};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
