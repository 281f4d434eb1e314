//! Send/retry loop

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use super::{
    interpret_response, write_checkpoint, DispatchConfig, DispatchLedger, DispatchOutcome,
    RequestSender, NOT_READY_STATUS,
};
use crate::app::output::OutputPaths;
use crate::constants::dispatch;
use crate::errors::DispatchResult;

/// Totals for one dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Resends after not-ready responses, across all requests
    pub retries: u32,
    pub elapsed: Duration,
}

impl DispatchSummary {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.sent += 1;
        self.retries += outcome.attempts.saturating_sub(1);
        if outcome.succeeded() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Sends requests one at a time through a [`RequestSender`]
#[derive(Debug)]
pub struct Dispatcher<S> {
    sender: S,
    config: DispatchConfig,
}

impl<S: RequestSender> Dispatcher<S> {
    pub fn new(sender: S, config: DispatchConfig) -> Self {
        Self { sender, config }
    }

    /// Send every URL, recording outcomes in the ledger and checkpoint at `paths`
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Output` if the ledger or checkpoint cannot be
    /// written. Failed requests are recorded, not returned as errors.
    pub async fn dispatch(&self, urls: &[String], paths: &OutputPaths) -> DispatchResult<DispatchSummary> {
        self.dispatch_with_progress(urls, paths, |_, _| {}).await
    }

    /// Like [`Dispatcher::dispatch`], calling `on_outcome` with the index and
    /// outcome of each request as it completes
    pub async fn dispatch_with_progress<F>(
        &self,
        urls: &[String],
        paths: &OutputPaths,
        mut on_outcome: F,
    ) -> DispatchResult<DispatchSummary>
    where
        F: FnMut(usize, &DispatchOutcome),
    {
        let start = Instant::now();
        let mut ledger = DispatchLedger::open(&paths.summary).await?;
        let mut summary = DispatchSummary::default();

        info!("Sending {} data requests", urls.len());

        for (i, url) in urls.iter().enumerate() {
            info!("Request url {} of {}: {}", i + 1, urls.len(), url);

            let outcome = self.send_until_ready(url).await;
            ledger.append(&outcome).await?;
            write_checkpoint(&paths.not_sent, &urls[i + 1..]).await?;

            summary.record(&outcome);
            on_outcome(i, &outcome);
        }

        if urls.is_empty() {
            write_checkpoint(&paths.not_sent, &[]).await?;
        }

        summary.elapsed = start.elapsed();
        info!(
            "Sent {} requests ({} accepted, {} failed, {} retries) in {:.2?}",
            summary.sent, summary.succeeded, summary.failed, summary.retries, summary.elapsed
        );
        Ok(summary)
    }

    /// Send one request, resending while the data system reports not ready
    async fn send_until_ready(&self, url: &str) -> DispatchOutcome {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = match self.sender.send(url).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Data request failed: {}: {}", url, e);
                    return DispatchOutcome {
                        status: format!("Data request failed: {}", e),
                        request_url: url.to_string(),
                        output_url: dispatch::NO_OUTPUT_URL.to_string(),
                        http_status: None,
                        attempts,
                    };
                }
            };

            let (status, output_url) = interpret_response(&response);
            let retries = attempts - 1;

            if response.status == NOT_READY_STATUS
                && self.config.max_retries.map_or(true, |max| retries < max)
            {
                warn!(
                    "Data request not ready ({}). Resending in {:?}",
                    status, self.config.retry_interval
                );
                sleep(self.config.retry_interval).await;
                continue;
            }

            if response.status == NOT_READY_STATUS {
                error!("Giving up on {} after {} retries", url, retries);
            } else if response.status != super::OK_STATUS {
                error!("Data request failed: {} {}", response.status, status);
            } else {
                info!("Data request sent: {}", status);
            }

            return DispatchOutcome {
                status,
                request_url: url.to_string(),
                output_url,
                http_status: Some(response.status),
                attempts,
            };
        }
    }
}
