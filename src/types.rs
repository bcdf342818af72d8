//! Batch request/response types and per-fetch outcomes

use crate::error::{FetchError, ValidationError};
use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// Outcome of fetching one URL: the raw body, or a classified failure
pub type FetchOutcome = std::result::Result<Bytes, FetchError>;

/// Wire envelope of an incoming batch.
///
/// A missing or `null` `urls` field decodes as an empty list, which
/// validation then rejects.
#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    #[serde(default)]
    urls: Option<Vec<String>>,
}

/// A validated batch of URLs, `1..=max_urls` long, in caller order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    urls: Vec<String>,
}

impl BatchRequest {
    /// Decode and bounds-check raw request bytes.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::WrongBodyFormat`] if the body is not a JSON object
    ///   with a `urls` string array
    /// - [`ValidationError::UrlsRequired`] if `urls` is empty
    /// - [`ValidationError::TooManyUrls`] if `urls` has more than `max_urls` entries
    pub fn from_slice(body: &[u8], max_urls: usize) -> Result<Self, ValidationError> {
        let envelope: BatchEnvelope = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "rejecting malformed batch body");
            ValidationError::WrongBodyFormat
        })?;
        Self::new(envelope.urls.unwrap_or_default(), max_urls)
    }

    /// Bounds-check an already decoded list of URLs
    pub fn new(urls: Vec<String>, max_urls: usize) -> Result<Self, ValidationError> {
        if urls.is_empty() {
            return Err(ValidationError::UrlsRequired);
        }
        if urls.len() > max_urls {
            return Err(ValidationError::TooManyUrls { max: max_urls });
        }
        Ok(Self { urls })
    }

    /// URLs in caller order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Number of URLs in the batch (never zero)
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false for a validated batch
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Consume the batch, yielding its URLs in caller order
    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

/// Successful batch result, aligned index-for-index with the request's URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Response bodies, decoded as UTF-8 (lossy)
    pub responses: Vec<String>,
}

/// Terminal state of one orchestrated batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationResult {
    /// Every URL was fetched successfully
    Completed(BatchResponse),
    /// The first failure observed, or the batch deadline
    Aborted(FetchError),
}

impl OrchestrationResult {
    /// Convert into a `Result`, treating an abort as the error
    pub fn into_result(self) -> Result<BatchResponse, FetchError> {
        match self {
            OrchestrationResult::Completed(response) => Ok(response),
            OrchestrationResult::Aborted(error) => Err(error),
        }
    }
}
