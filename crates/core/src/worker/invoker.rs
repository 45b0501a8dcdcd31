//! Worker invoker with bounded retry.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::metrics;
use crate::transfer::{WorkerInvocation, WorkerResult};

use super::{InvocationError, RetryPolicy, Worker, WorkerRequest};

/// Calls the worker, retrying invocation-layer failures per the retry policy.
///
/// Only [`WorkerError::is_retryable`](super::WorkerError::is_retryable)
/// failures are retried. A response whose status reports failure is returned
/// as-is: that is a business outcome for the orchestrator to judge.
#[derive(Clone)]
pub struct WorkerInvoker {
    worker: Arc<dyn Worker>,
    policy: RetryPolicy,
}

impl WorkerInvoker {
    pub fn new(worker: Arc<dyn Worker>, policy: RetryPolicy) -> Self {
        Self { worker, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn invoke(&self, invocation: &WorkerInvocation) -> Result<WorkerResult, InvocationError> {
        let request = WorkerRequest::from(invocation);
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = self.worker.call(&request).await;
            metrics::WORKER_CALL_DURATION
                .with_label_values(&[self.worker.name()])
                .observe(started.elapsed().as_secs_f64());

            match outcome {
                Ok(response) => {
                    let result = WorkerResult::from(response);
                    metrics::WORKER_INVOCATIONS
                        .with_label_values(&[result.status.as_str()])
                        .inc();
                    debug!(
                        request_id = %invocation.request_id,
                        sequence = invocation.attempt_sequence_number,
                        attempt,
                        status = %result.reported_status,
                        "Worker invocation returned"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    metrics::WORKER_INVOCATIONS
                        .with_label_values(&[e.kind()])
                        .inc();

                    let delay = if e.is_retryable() {
                        self.policy.delay_after(attempt)
                    } else {
                        None
                    };

                    let Some(delay) = delay else {
                        error!(
                            request_id = %invocation.request_id,
                            sequence = invocation.attempt_sequence_number,
                            attempts = attempt,
                            retryable = e.is_retryable(),
                            "Worker invocation failed: {}",
                            e
                        );
                        return Err(InvocationError {
                            attempts: attempt,
                            source: e,
                        });
                    };

                    warn!(
                        request_id = %invocation.request_id,
                        sequence = invocation.attempt_sequence_number,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Worker invocation failed, retrying: {}",
                        e
                    );
                    metrics::RETRY_ATTEMPTS.inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
