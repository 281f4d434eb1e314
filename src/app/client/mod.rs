//! HTTP client for the OOI data services
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and source locations
//! - `http`: Core HTTP operations with resilience patterns
//!
//! [`OoiClient`] fetches the QC Database tables and the live catalog, and
//! sends data requests with the user's API credentials.

use serde_json::Value;
use tracing::{debug, info};

use crate::app::catalog::{CatalogSource, QcDatabaseTables};
use crate::app::dispatch::{DispatchResponse, RequestSender};
use crate::auth::Credentials;
use crate::errors::{AuthError, CatalogError, CatalogResult, DispatchResult, Result};

pub mod config;
pub mod http;

pub use config::{ClientConfig, SourceConfig};

use http::{HttpHandler, RetryPolicy};

/// HTTP client for the OOI data services
#[derive(Debug)]
pub struct OoiClient {
    http_handler: HttpHandler,
    sources: SourceConfig,
    credentials: Option<Credentials>,
}

impl OoiClient {
    /// Creates a client without credentials
    ///
    /// Sufficient for comparing catalogs; sending requests needs
    /// [`OoiClient::with_credentials`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the rate limit
    /// is zero.
    pub fn new(config: ClientConfig, sources: SourceConfig) -> Result<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!("Created OOI client ({} rps)", config.rate_limit_rps);

        Ok(Self {
            http_handler,
            sources,
            credentials: None,
        })
    }

    /// Attach API credentials used for data requests
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Source locations this client fetches from
    pub fn sources(&self) -> &SourceConfig {
        &self.sources
    }

    /// Fetch a source document as text
    async fn fetch_text(&self, source_name: &str, url: &str) -> CatalogResult<String> {
        debug!("Fetching {} from {}", source_name, url);

        let response = self
            .http_handler
            .get(url, None, RetryPolicy::Resilient)
            .await
            .map_err(|e| CatalogError::unavailable(source_name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::unavailable(
                source_name,
                format!("HTTP {} from {}", status, url),
            ));
        }

        let text = response.text().await.map_err(|error| CatalogError::Http {
            source_name: source_name.to_string(),
            error,
        })?;

        info!("Fetched {} ({} bytes)", source_name, text.len());
        Ok(text)
    }
}

impl CatalogSource for OoiClient {
    async fn fetch_qc_database(&self, include_regions: bool) -> CatalogResult<QcDatabaseTables> {
        let streams_csv = self
            .fetch_text("QC Database streams", &self.sources.streams_url)
            .await?;
        let descriptions_csv = self
            .fetch_text("QC Database stream descriptions", &self.sources.descriptions_url)
            .await?;
        let regions_csv = if include_regions {
            Some(
                self.fetch_text("QC Database regions", &self.sources.regions_url)
                    .await?,
            )
        } else {
            None
        };

        Ok(QcDatabaseTables {
            streams_csv,
            descriptions_csv,
            regions_csv,
        })
    }

    async fn fetch_live_catalog(&self) -> CatalogResult<String> {
        self.fetch_text("live data catalog", &self.sources.catalog_url)
            .await
    }
}

impl RequestSender for OoiClient {
    async fn send(&self, url: &str) -> DispatchResult<DispatchResponse> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AuthError::MissingCredentials)?;

        let response = self
            .http_handler
            .get(url, Some(credentials), RetryPolicy::TransportOnly)
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // A body that is not JSON carries no status fields
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(DispatchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::dispatch::{DispatchConfig, Dispatcher};
    use crate::app::output::OutputPaths;
    use crate::errors::DispatchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one fixed response to every connection, counting requests
    async fn serve_fixed(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/api/m2m/12576/sensor/inv", address), hits)
    }

    fn credentialed_client() -> OoiClient {
        OoiClient::new(ClientConfig::default(), SourceConfig::default())
            .unwrap()
            .with_credentials(Credentials::new("ooi-user", "TEMP-TOKEN").unwrap())
    }

    #[tokio::test]
    async fn test_overloaded_data_request_sent_once() {
        let (url, hits) = serve_fixed(
            "503 Service Unavailable",
            r#"{"message": {"status": "Service unavailable"}}"#,
        )
        .await;
        let temp_dir = TempDir::new().unwrap();
        let paths = OutputPaths::new(temp_dir.path(), "20180109T1432");
        let client = credentialed_client();

        let response = client.send(&url).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let dispatcher = Dispatcher::new(&client, DispatchConfig::default());
        let summary = dispatcher.dispatch(&[url.clone()], &paths).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.retries, 0);

        let ledger = std::fs::read_to_string(&paths.summary).unwrap();
        let row = ledger.lines().nth(1).unwrap();
        assert_eq!(row, format!("Service unavailable,{},no_output_url", url));
    }

    #[tokio::test]
    async fn test_rate_limited_data_request_keeps_server_status() {
        let (url, hits) = serve_fixed(
            "429 Too Many Requests",
            r#"{"message": {"status": "Too many requests"}}"#,
        )
        .await;
        let client = credentialed_client();

        let response = client.send(&url).await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(
            response.body.pointer("/message/status").and_then(|v| v.as_str()),
            Some("Too many requests")
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_client_creation() {
        let client = OoiClient::new(ClientConfig::default(), SourceConfig::default()).unwrap();
        assert_eq!(client.sources(), &SourceConfig::default());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = ClientConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        assert!(OoiClient::new(config, SourceConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_send_requires_credentials() {
        let client = OoiClient::new(ClientConfig::default(), SourceConfig::default()).unwrap();
        let result = client.send("https://ooinet.oceanobservatories.org/api/m2m").await;
        assert!(matches!(
            result,
            Err(DispatchError::Auth(AuthError::MissingCredentials))
        ));
    }

    #[tokio::test]
    async fn test_invalid_source_url_is_unavailable() {
        let sources = SourceConfig {
            catalog_url: "not a url".to_string(),
            ..Default::default()
        };
        let client = OoiClient::new(ClientConfig::default(), sources).unwrap();
        assert!(matches!(
            client.fetch_live_catalog().await,
            Err(CatalogError::SourceUnavailable { .. })
        ));
    }
}
