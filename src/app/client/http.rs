//! Core HTTP operations with rate limiting and retry logic
//!
//! Every request passes through a rate limiter and is retried with
//! exponential backoff on transport errors, 429 and 503. Other statuses,
//! including the data system's 400 "not ready", are returned to the caller.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::auth::Credentials;
use crate::constants::limits;
use crate::errors::{ConfigError, DispatchError, DispatchResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// Failures a GET is retried on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Transport errors, 429 and 503, with exponential backoff
    Resilient,
    /// Transport errors only; every HTTP status is returned to the caller
    TransportOnly,
}

impl RetryPolicy {
    /// Whether a response with `status` is backed off and resent
    pub fn backs_off(&self, status: u16) -> bool {
        match self {
            Self::Resilient => status == 429 || status == 503,
            Self::TransportOnly => false,
        }
    }
}

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> Result<Self, ConfigError> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> Result<DirectRateLimiter, ConfigError> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "client.rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// GET `url`, optionally with basic authentication
    ///
    /// Data requests use [`RetryPolicy::TransportOnly`] so the data system's
    /// own status and message reach the ledger.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidUrl` for an unparseable URL, and
    /// `RateLimitExceeded`, `ServerOverloaded` or `MaxRetriesExceeded` once
    /// retries are exhausted.
    pub async fn get(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        policy: RetryPolicy,
    ) -> DispatchResult<Response> {
        let url = Url::parse(url).map_err(|e| DispatchError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        self.send_with_retry(&url, policy, || {
            let request = self.client.get(url.as_str());
            match credentials {
                Some(c) => request.basic_auth(&c.username, Some(c.token())),
                None => request,
            }
        })
        .await
    }

    async fn send_with_retry<F>(
        &self,
        url: &Url,
        policy: RetryPolicy,
        build: F,
    ) -> DispatchResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        loop {
            // Apply rate limiting with jitter to avoid thundering herd
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
                .await;

            match build().send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if policy.backs_off(status) {
                        if retries < limits::MAX_RETRIES {
                            retries += 1;
                            let delay = backoff_delay(retries);
                            tracing::warn!(
                                "Server responded {} for {}. Backing off for {}ms",
                                status,
                                url,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if status == 429 {
                            DispatchError::RateLimitExceeded
                        } else {
                            DispatchError::ServerOverloaded
                        });
                    }

                    tracing::debug!("Received {} from {}", status, url);
                    return Ok(response);
                }
                Err(e) if retries < limits::MAX_RETRIES => {
                    retries += 1;
                    let delay = backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        limits::MAX_RETRIES,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Request failed after {} retries: {}",
                        limits::MAX_RETRIES,
                        e
                    );
                    return Err(DispatchError::MaxRetriesExceeded {
                        max_retries: limits::MAX_RETRIES,
                    });
                }
            }
        }
    }
}

/// Exponential backoff delay before the given retry
fn backoff_delay(retry: u32) -> Duration {
    Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(retry))
}
