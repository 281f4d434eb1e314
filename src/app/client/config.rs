//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! and the locations of the source documents it fetches.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits, ooi};
use crate::errors::DispatchResult;

/// Configuration for HTTP client optimizations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Enable HTTP/2 adaptive window
    pub http2: bool,
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http2: false,
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> DispatchResult<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if self.http2 {
            client_builder = client_builder.http2_adaptive_window(true);
        }

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        Ok(client_builder.build()?)
    }
}

/// Locations of the QC Database tables and the live catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Live GUI data catalog endpoint
    pub catalog_url: String,
    /// QC Database instrument-stream table
    pub streams_url: String,
    /// QC Database stream description table
    pub descriptions_url: String,
    /// QC Database region table
    pub regions_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_url: ooi::CATALOG_URL.to_string(),
            streams_url: ooi::QCDB_STREAMS_URL.to_string(),
            descriptions_url: ooi::QCDB_STREAM_DESCRIPTIONS_URL.to_string(),
            regions_url: ooi::QCDB_REGIONS_URL.to_string(),
        }
    }
}
