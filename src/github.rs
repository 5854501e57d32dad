//! GitHub traffic API client.
//!
//! Requests are blocking and sequential. Every request carries a timeout, and
//! transient failures (5xx, rate limiting, timeouts) are retried with bounded
//! exponential backoff.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;

use crate::data::{Metric, TrafficRecord, TrafficSummary};
use crate::repos::RepoId;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Why a traffic request produced no records
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("rate limited (HTTP {status})")]
    RateLimited {
        status: u16,
        /// Wait advised by the server, if it sent one
        wait: Option<Duration>,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } | FetchError::RateLimited { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
            FetchError::Body(_) => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status } => *status >= 500,
            FetchError::RateLimited { .. } => true,
            FetchError::Transport(e) => e.is_timeout() || e.is_connect(),
            FetchError::Body(_) => false,
        }
    }
}

/// Retry behavior for a single traffic request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Wait as long as `Retry-After` / `x-ratelimit-reset` say instead of backing off
    pub respect_rate_limit: bool,
    /// Longest server-advised wait that is honored; longer waits give up
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            respect_rate_limit: false,
            max_rate_limit_wait: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 0-based retry, capped at `max_delay`
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay before retrying after `error`, or `None` to give up
    fn delay_for(&self, retry: u32, error: &FetchError) -> Option<Duration> {
        if retry >= self.max_retries || !error.is_retryable() {
            return None;
        }
        match error {
            FetchError::RateLimited {
                wait: Some(wait), ..
            } if self.respect_rate_limit => {
                (*wait <= self.max_rate_limit_wait).then_some(*wait)
            }
            _ => Some(self.backoff(retry)),
        }
    }
}

/// Run `attempt` until it succeeds or the policy gives up, sleeping between tries
pub fn with_retries<T>(
    policy: &RetryPolicy,
    mut sleep: impl FnMut(Duration),
    mut attempt: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut retry = 0;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) => match policy.delay_for(retry, &e) {
                Some(delay) => {
                    retry += 1;
                    tracing::warn!(
                        error = %e,
                        retry,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    sleep(delay);
                }
                None => return Err(e),
            },
        }
    }
}

/// Anything that can produce traffic records for a repository
pub trait TrafficSource {
    fn fetch(&self, repo: &RepoId, metric: Metric) -> Result<Vec<TrafficRecord>, FetchError>;
}

/// Blocking client for the traffic endpoints
pub struct GithubClient {
    client: Client,
    api_url: String,
    token: String,
    retry: RetryPolicy,
}

impl GithubClient {
    pub fn new(
        api_url: &str,
        token: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(GithubClient {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            retry,
        })
    }

    fn traffic_url(&self, repo: &RepoId, metric: Metric) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url,
            repo.owner(),
            repo.name(),
            metric.endpoint()
        )
    }

    fn fetch_once(&self, url: &str) -> Result<TrafficSummary, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth("", Some(&self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("gh-traffic/", env!("CARGO_PKG_VERSION")))
            .send()?;

        if let Some(err) = classify_failure(response.status(), response.headers(), Utc::now()) {
            return Err(err);
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl TrafficSource for GithubClient {
    fn fetch(&self, repo: &RepoId, metric: Metric) -> Result<Vec<TrafficRecord>, FetchError> {
        let url = self.traffic_url(repo, metric);
        let summary = with_retries(&self.retry, std::thread::sleep, || self.fetch_once(&url))?;

        tracing::debug!(
            repo = %repo,
            metric = metric.key(),
            count = summary.count,
            uniques = summary.uniques,
            days = summary.records.len(),
            "traffic fetched"
        );
        Ok(summary.records)
    }
}

/// Map a non-success response to the matching error; `None` for 2xx
fn classify_failure(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    let exhausted = header_str(headers, RATE_LIMIT_REMAINING).is_some_and(|v| v.trim() == "0");
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && exhausted) {
        return Some(FetchError::RateLimited {
            status: status.as_u16(),
            wait: advised_wait(headers, now),
        });
    }

    Some(FetchError::Status {
        status: status.as_u16(),
    })
}

/// Wait advised by `Retry-After` (seconds or HTTP-date), else by `x-ratelimit-reset`
fn advised_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(value) = header_str(headers, RETRY_AFTER.as_str()) {
        let value = value.trim();
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if let Ok(at) = DateTime::parse_from_rfc2822(value) {
            return Some(until(at.with_timezone(&Utc), now));
        }
    }

    let reset = header_str(headers, RATE_LIMIT_RESET)?.trim().parse::<i64>().ok()?;
    let at = DateTime::from_timestamp(reset, 0)?;
    Some(until(at, now))
}

fn until(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
