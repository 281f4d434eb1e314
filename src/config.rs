//! Configuration management for OOI Requests
//!
//! This module provides TOML configuration with multi-location loading and
//! zero-config defaults. Every section and field is optional in the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, DispatchConfig, RequestSettings, SourceConfig};
use crate::constants::{http, limits, logging, ooi};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Source document locations
    pub sources: SourcesConfigToml,
    /// Data request construction
    pub requests: RequestsConfigToml,
    /// Dispatch retry policy
    pub dispatch: DispatchConfigToml,
    /// Output files
    pub output: OutputConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Enable HTTP/2 adaptive window
    pub http2: bool,
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            http2: false,
            tcp_keepalive_secs: Some(30),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly source locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfigToml {
    pub catalog_url: String,
    pub streams_url: String,
    pub descriptions_url: String,
    pub regions_url: String,
}

impl Default for SourcesConfigToml {
    fn default() -> Self {
        Self {
            catalog_url: ooi::CATALOG_URL.to_string(),
            streams_url: ooi::QCDB_STREAMS_URL.to_string(),
            descriptions_url: ooi::QCDB_STREAM_DESCRIPTIONS_URL.to_string(),
            regions_url: ooi::QCDB_REGIONS_URL.to_string(),
        }
    }
}

/// TOML-friendly request settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestsConfigToml {
    /// M2M sensor inventory endpoint
    pub base_endpoint: String,
    /// Ask for annotations to be bundled with each export
    pub include_annotations: bool,
    /// Join array names from the region table
    pub enrich_regions: bool,
}

impl Default for RequestsConfigToml {
    fn default() -> Self {
        Self {
            base_endpoint: ooi::M2M_SENSOR_INV_URL.to_string(),
            include_annotations: true,
            enrich_regions: true,
        }
    }
}

/// TOML-friendly dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfigToml {
    /// Wait before resending a not-ready request, in seconds
    pub retry_interval_secs: u64,
    /// Cap on resends of one request (None = until ready)
    pub max_retries: Option<u32>,
}

impl Default for DispatchConfigToml {
    fn default() -> Self {
        Self {
            retry_interval_secs: limits::NOT_READY_RETRY_INTERVAL.as_secs(),
            max_retries: None,
        }
    }
}

/// TOML-friendly output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfigToml {
    /// Directory the run's CSV files are written to
    pub directory: PathBuf,
}

impl Default for OutputConfigToml {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise the first file found in the
    /// standard locations is used, falling back to defaults.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::NotFound { path }.into()),
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => {
                debug!("Loading config from: {}", path.display());
                Self::load_from_file(&path).await
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write a commented default configuration file
    ///
    /// Writes to `path`, or the user config location when `None`. An existing
    /// file is only replaced when `force` is set.
    pub async fn init(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file already exists: {} (use --force to overwrite)",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        info!("Created default configuration file: {}", config_path.display());
        Ok(config_path)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::generic(format!("Failed to render configuration: {}", e)))
    }

    /// Runtime HTTP client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_runtime_config()
    }

    /// Runtime source locations
    pub fn source_config(&self) -> SourceConfig {
        self.sources.to_runtime_config()
    }

    /// Runtime request settings
    pub fn request_settings(&self) -> RequestSettings {
        self.requests.to_runtime_config()
    }

    /// Runtime dispatch policy
    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch.to_runtime_config()
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            PathBuf::from("./ooi-requests.toml"),
            PathBuf::from("./config.toml"),
        ];
        if let Ok(user_config) = Self::default_config_path() {
            search_paths.push(user_config);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join("ooi-requests").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::InvalidFormat)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# OOI Requests Configuration
# Every setting is optional; remove a line to use its default.

[client]
# HTTP client settings
http2 = false
tcp_keepalive_secs = 30
tcp_nodelay = true
pool_idle_timeout_secs = {pool_idle}
pool_max_per_host = {pool_max}
request_timeout_secs = {request_timeout}
connect_timeout_secs = {connect_timeout}
rate_limit_rps = {rps}

[sources]
# QC Database tables and the live data catalog
catalog_url = "{catalog}"
streams_url = "{streams}"
descriptions_url = "{descriptions}"
regions_url = "{regions}"

[requests]
# Data request construction
base_endpoint = "{endpoint}"
include_annotations = true
enrich_regions = true

[dispatch]
# Seconds to wait before resending a request the data system is not ready for
retry_interval_secs = {retry_interval}
# max_retries = 10  # Uncomment to stop resending after this many attempts

[output]
# Directory for comparison, request URL and summary files
directory = "."

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool_max = http::POOL_MAX_PER_HOST,
            request_timeout = http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout = http::CONNECT_TIMEOUT.as_secs(),
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            catalog = ooi::CATALOG_URL,
            streams = ooi::QCDB_STREAMS_URL,
            descriptions = ooi::QCDB_STREAM_DESCRIPTIONS_URL,
            regions = ooi::QCDB_REGIONS_URL,
            endpoint = ooi::M2M_SENSOR_INV_URL,
            retry_interval = limits::NOT_READY_RETRY_INTERVAL.as_secs(),
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            http2: self.http2,
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

impl SourcesConfigToml {
    /// Convert to runtime SourceConfig
    pub fn to_runtime_config(&self) -> SourceConfig {
        SourceConfig {
            catalog_url: self.catalog_url.clone(),
            streams_url: self.streams_url.clone(),
            descriptions_url: self.descriptions_url.clone(),
            regions_url: self.regions_url.clone(),
        }
    }
}

impl RequestsConfigToml {
    /// Convert to runtime RequestSettings
    pub fn to_runtime_config(&self) -> RequestSettings {
        RequestSettings {
            base_endpoint: self.base_endpoint.clone(),
            include_annotations: self.include_annotations,
        }
    }
}

impl DispatchConfigToml {
    /// Convert to runtime DispatchConfig
    pub fn to_runtime_config(&self) -> DispatchConfig {
        DispatchConfig {
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            max_retries: self.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_matches_runtime_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.source_config(), SourceConfig::default());
        assert_eq!(config.request_settings(), RequestSettings::default());
        assert_eq!(config.dispatch_config(), DispatchConfig::default());
        assert_eq!(
            config.client_config().request_timeout,
            ClientConfig::default().request_timeout
        );
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("# OOI Requests Configuration"));
        assert!(content.contains("[dispatch]"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ooi-requests.toml");

        let test_config = r#"
[dispatch]
max_retries = 5

[requests]
include_annotations = false

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.dispatch_config().max_retries, Some(5));
        assert_eq!(
            config.dispatch_config().retry_interval,
            Duration::from_secs(60)
        );
        assert!(!config.request_settings().include_annotations);
        assert!(config.requests.enrich_regions);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
    }

    #[tokio::test]
    async fn test_invalid_toml_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[dispatch\nmax_retries = ")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("conf").join("config.toml");

        let written = AppConfig::init(Some(config_path.clone()), false)
            .await
            .unwrap();
        assert_eq!(written, config_path);
        assert!(AppConfig::init(Some(config_path.clone()), false).await.is_err());
        assert!(AppConfig::init(Some(config_path), true).await.is_ok());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = AppConfig::default();
        config.dispatch.max_retries = Some(3);
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
