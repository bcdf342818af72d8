//! Single-URL retrieval and outcome classification.
//!
//! The [`Fetch`] trait abstracts one outbound GET so the orchestrator can be
//! driven by scripted fetchers in tests. [`ReqwestFetcher`] is the production
//! implementation.

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::types::FetchOutcome;
use async_trait::async_trait;

/// Performs one retrieval for one URL.
///
/// Implementations must not retry and must produce exactly one outcome.
/// Deadline enforcement belongs to the caller: the orchestrator drops the
/// returned future when the batch deadline fires, which aborts any in-flight
/// I/O.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` and classify the result
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Production fetcher backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher whose connections are bounded by `config.connect_timeout`
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for ReqwestFetcher {
    #[tracing::instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_send_error(url, &e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            tracing::warn!(status = status.as_u16(), "upstream returned error status");
            return Err(FetchError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to read upstream body");
            FetchError::BodyRead {
                url: url.to_string(),
            }
        })?;

        tracing::debug!(
            status = status.as_u16(),
            body_len = body.len(),
            "fetch completed"
        );
        Ok(body)
    }
}

/// Timeouts take precedence over every other transport failure.
fn classify_send_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        tracing::warn!(error = %error, "upstream request timed out");
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        tracing::warn!(
            error = %error,
            connect = error.is_connect(),
            builder = error.is_builder(),
            "upstream request failed"
        );
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
