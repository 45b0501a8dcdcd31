//! Mock worker for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::worker::{Worker, WorkerError, WorkerRequest, WorkerResponse};

use super::MockObjectStore;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedCall {
    Respond(WorkerResponse),
    Fail(WorkerError),
}

/// A recorded worker call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The payload the worker received.
    pub request: WorkerRequest,
    /// When the call arrived, on the tokio clock.
    pub at: Instant,
}

/// Mock implementation of the Worker trait.
///
/// Replies are taken from a script queue first, then from the fallback.
/// Calls with neither fail with [`WorkerError::Internal`].
///
/// Timestamps use the tokio clock, so with `start_paused = true` the gaps
/// between calls are exactly the backoff delays.
///
/// # Example
///
/// ```rust,ignore
/// use vodmigrator_core::testing::{fixtures, MockWorker};
///
/// let worker = MockWorker::new();
/// worker.push_response(fixtures::timeout_response()).await;
/// worker.always_respond(fixtures::complete_response()).await;
///
/// // ... run a transfer ...
/// assert_eq!(worker.call_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockWorker {
    script: Arc<RwLock<VecDeque<ScriptedCall>>>,
    fallback: Arc<RwLock<Option<ScriptedCall>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// Store that successful calls write a segment object into.
    output: Arc<RwLock<Option<Arc<MockObjectStore>>>>,
}

impl Default for MockWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorker {
    /// Create a new mock worker with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(RwLock::new(VecDeque::new())),
            fallback: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(None)),
        }
    }

    /// Queue a response for the next unscripted call.
    pub async fn push_response(&self, response: WorkerResponse) {
        self.script
            .write()
            .await
            .push_back(ScriptedCall::Respond(response));
    }

    /// Queue an invocation error for the next unscripted call.
    pub async fn push_error(&self, error: WorkerError) {
        self.script.write().await.push_back(ScriptedCall::Fail(error));
    }

    /// Respond with `response` once the script is exhausted.
    pub async fn always_respond(&self, response: WorkerResponse) {
        *self.fallback.write().await = Some(ScriptedCall::Respond(response));
    }

    /// Fail with `error` once the script is exhausted.
    pub async fn always_fail(&self, error: WorkerError) {
        *self.fallback.write().await = Some(ScriptedCall::Fail(error));
    }

    /// Write one object per successful call into `store`, under the
    /// destination prefix from the request.
    pub async fn write_output_to(&self, store: Arc<MockObjectStore>) {
        *self.output.write().await = Some(store);
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Time elapsed between consecutive calls.
    pub async fn call_gaps(&self) -> Vec<Duration> {
        self.calls
            .read()
            .await
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }

    async fn next_reply(&self) -> Option<ScriptedCall> {
        if let Some(call) = self.script.write().await.pop_front() {
            return Some(call);
        }
        self.fallback.read().await.clone()
    }
}

#[async_trait]
impl Worker for MockWorker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn call(&self, request: &WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        self.calls.write().await.push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });

        match self.next_reply().await {
            Some(ScriptedCall::Respond(response)) => {
                if let Some(store) = self.output.read().await.as_ref() {
                    let key = format!(
                        "{}/segment_{}.ts",
                        request.destination_prefix, request.attempt_sequence_number
                    );
                    store.insert(&request.destination_container, &key).await;
                }
                Ok(response)
            }
            Some(ScriptedCall::Fail(error)) => Err(error),
            None => Err(WorkerError::Internal(
                "mock worker has no scripted reply".to_string(),
            )),
        }
    }
}
