//! Batch fetch handler.

use crate::api::AppState;
use crate::error::Result;
use crate::types::{BatchRequest, OrchestrationResult};
use axum::{body::Bytes, extract::State};

/// POST / - Fetch a batch of URLs concurrently
///
/// Accepts `{"urls": [...]}` (1..=`fetch.max_urls` entries) and answers with
/// `{"responses": [...]}` in the same order, or the first failure as plain
/// text. The body is decoded regardless of `Content-Type`.
pub async fn fetch_batch(State(state): State<AppState>, body: Bytes) -> Result<OrchestrationResult> {
    let batch = BatchRequest::from_slice(&body, state.config.fetch.max_urls)?;
    tracing::debug!(urls = batch.len(), "accepted batch");
    Ok(state.orchestrator.run(batch).await)
}
