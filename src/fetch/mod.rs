//! HTTP boundary: one GET per attempt against the feed endpoint, with a
//! bounded retry budget for timeouts.

pub mod url_param;

pub use url_param::UrlParam;

use async_trait::async_trait;
use reqwest::{Request, Response};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::FetchError;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Plain [`HttpClient`] with per-request and connect timeouts. Auth wrappers
/// such as [`UrlParam`] compose around it.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(classify)?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// What the retry loop does after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Payload in hand; stop.
    Success,
    /// Attempt timed out with budget remaining; run attempt `n` next.
    Retrying(u32),
    /// Out of budget, or a failure that is never retried; stop.
    Failed,
}

/// State transition for the retry loop. Only timeouts consume retry budget;
/// every other failure is fatal on the spot.
pub fn transition(
    result: Result<(), &FetchError>,
    attempt: u32,
    max_attempts: u32,
) -> AttemptOutcome {
    match result {
        Ok(()) => AttemptOutcome::Success,
        Err(FetchError::Timeout) if attempt < max_attempts => AttemptOutcome::Retrying(attempt + 1),
        Err(_) => AttemptOutcome::Failed,
    }
}

/// Retrieves one raw feed snapshot, retrying timed-out attempts up to
/// `max_attempts` times. Every attempt is logged.
pub async fn fetch_snapshot<C: HttpClient>(
    client: &C,
    url: &str,
    max_attempts: u32,
) -> Result<Vec<u8>, FetchError> {
    let mut attempt = 1;
    loop {
        let result = try_fetch(client, url).await;
        match transition(result.as_ref().map(|_| ()), attempt, max_attempts) {
            AttemptOutcome::Success => {
                info!(attempt, "Feed request successful");
                return result;
            }
            AttemptOutcome::Retrying(next) => {
                warn!(attempt, max_attempts, "Feed request timed out, retrying");
                attempt = next;
            }
            AttemptOutcome::Failed => return result,
        }
    }
}

async fn try_fetch<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = url.parse().map_err(|e| FetchError::RequestFailed {
        message: format!("invalid feed url {url}: {e}"),
    })?;
    let req = Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await.map_err(classify)?;
    let resp = resp.error_for_status().map_err(classify)?;
    let bytes = resp.bytes().await.map_err(classify)?;
    Ok(bytes.to_vec())
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::RequestFailed {
            message: e.to_string(),
        }
    }
}
