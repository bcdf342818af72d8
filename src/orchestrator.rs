//! Fan-out/fan-in orchestration of one batch.
//!
//! [`Orchestrator::run`] spawns one task per URL, then races three signals:
//!
//! - the batch deadline expiring
//! - any task reporting a failure
//! - every slot being filled
//!
//! The first of these decides the [`OrchestrationResult`]. Remaining tasks are
//! cancelled as soon as a winner is chosen, so no producer is ever left
//! blocked on a result nobody reads.
//!
//! Output order always matches input order: each task owns one slot index and
//! hands `(index, outcome)` back through its join handle, so slots are written
//! by the orchestrator alone and never contended.

use crate::error::FetchError;
use crate::fetcher::Fetch;
use crate::types::{BatchRequest, BatchResponse, FetchOutcome, OrchestrationResult};
use axum::body::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Fixed-size, index-addressed store of successful bodies plus the
/// completion counter.
#[derive(Debug)]
pub struct SlotArray {
    slots: Vec<Option<Bytes>>,
    filled: usize,
}

impl SlotArray {
    /// Allocate `len` empty slots
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            filled: 0,
        }
    }

    /// Store the body fetched for slot `index`.
    ///
    /// Each index is owned by exactly one task and therefore filled at most
    /// once; a repeated fill leaves the counter unchanged.
    pub fn fill(&mut self, index: usize, body: Bytes) {
        let Some(slot) = self.slots.get_mut(index) else {
            tracing::error!(index, len = self.slots.len(), "slot index out of range");
            return;
        };
        debug_assert!(slot.is_none(), "slot {index} filled twice");
        if slot.replace(body).is_none() {
            self.filled += 1;
        }
    }

    /// Number of slots filled so far
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// True once every slot holds a body
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Decode every slot (lossy UTF-8) in index order.
    ///
    /// Returns `None` if any slot is still empty.
    pub fn into_response(self) -> Option<BatchResponse> {
        let responses = self
            .slots
            .into_iter()
            .map(|slot| slot.map(|body| String::from_utf8_lossy(&body).into_owned()))
            .collect::<Option<Vec<_>>>()?;
        Some(BatchResponse { responses })
    }
}

/// Runs batches against a shared [`Fetch`] implementation under a fixed
/// per-batch deadline.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<dyn Fetch>,
    deadline: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator that gives every batch `deadline` to finish
    pub fn new(fetcher: impl Fetch + 'static, deadline: Duration) -> Self {
        Self::with_shared(Arc::new(fetcher), deadline)
    }

    /// Create an orchestrator around an already shared fetcher
    pub fn with_shared(fetcher: Arc<dyn Fetch>, deadline: Duration) -> Self {
        Self { fetcher, deadline }
    }

    /// Per-batch deadline
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Fetch every URL of `batch` concurrently, starting the deadline now
    pub async fn run(&self, batch: BatchRequest) -> OrchestrationResult {
        self.run_until(batch, Instant::now() + self.deadline).await
    }

    /// Fetch every URL of `batch` concurrently, aborting at `deadline`
    #[tracing::instrument(skip_all, fields(urls = batch.len()))]
    pub async fn run_until(&self, batch: BatchRequest, deadline: Instant) -> OrchestrationResult {
        let started = Instant::now();
        let cancel = CancellationToken::new();

        let mut slots = SlotArray::new(batch.len());
        let mut tasks = spawn_fetches(&self.fetcher, batch, &cancel);

        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);

        let result = loop {
            if slots.is_complete() {
                break match slots.into_response() {
                    Some(response) => OrchestrationResult::Completed(response),
                    None => OrchestrationResult::Aborted(FetchError::Internal),
                };
            }

            tokio::select! {
                _ = &mut expiry => {
                    tracing::warn!(
                        filled = slots.filled(),
                        pending = tasks.len(),
                        "batch deadline expired"
                    );
                    break OrchestrationResult::Aborted(FetchError::DeadlineExceeded);
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(Some((index, Ok(body))))) => slots.fill(index, body),
                    Some(Ok(Some((index, Err(error))))) => {
                        tracing::info!(index, error = %error, "fetch failed, aborting batch");
                        break OrchestrationResult::Aborted(error);
                    }
                    // Only reachable after cancellation, which happens on exit
                    Some(Ok(None)) => {}
                    Some(Err(join_error)) => {
                        tracing::error!(error = %join_error, "fetch task failed");
                        break OrchestrationResult::Aborted(FetchError::Internal);
                    }
                    None => {
                        tracing::error!(filled = slots.filled(), "fetch tasks exhausted before batch completed");
                        break OrchestrationResult::Aborted(FetchError::Internal);
                    }
                },
            }
        };

        // Dropping the set would abort too; cancel first so fetches unwind cooperatively
        cancel.cancel();
        tasks.abort_all();

        match &result {
            OrchestrationResult::Completed(response) => tracing::info!(
                responses = response.responses.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch completed"
            ),
            OrchestrationResult::Aborted(error) => tracing::info!(
                error = %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch aborted"
            ),
        }
        result
    }
}

/// Spawn one task per URL. A task yields `None` if it was cancelled before
/// its fetch finished.
fn spawn_fetches(
    fetcher: &Arc<dyn Fetch>,
    batch: BatchRequest,
    cancel: &CancellationToken,
) -> JoinSet<Option<(usize, FetchOutcome)>> {
    let mut tasks = JoinSet::new();
    for (index, url) in batch.into_urls().into_iter().enumerate() {
        let fetcher = Arc::clone(fetcher);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = fetcher.fetch(&url) => Some((index, outcome)),
            }
        });
    }
    tasks
}
