//! Transfer orchestrator implementation.
//!
//! Drives one request through the state machine in [`super::state`]:
//! performs the side effect that belongs to the current state, feeds the
//! outcome to [`transition`], and repeats until a terminal state is reached.

use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::guard::IdempotencyGuard;
use crate::metrics;
use crate::notify::NotificationGateway;
use crate::transfer::{
    InvocationSettings, LifecycleStage, NotificationEvent, TransferRequest, WorkerInvocation,
    WorkerResult,
};
use crate::worker::WorkerInvoker;

use super::state::{
    transition, FailureCause, PreconditionCause, StepEvent, TransferState, TransitionError,
    TransitionLimits,
};
use super::types::{OrchestratorError, RunContext, TransferOutcome};

/// Bookkeeping for a single run.
struct RunTracker {
    run_id: String,
    request: TransferRequest,
    started: Instant,
    invocations: u32,
    resumptions: u32,
    last_result: Option<WorkerResult>,
}

impl RunTracker {
    fn new(request: TransferRequest) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            request,
            started: Instant::now(),
            invocations: 0,
            resumptions: 0,
            last_result: None,
        }
    }

    fn context(&self) -> RunContext {
        RunContext {
            run_id: self.run_id.clone(),
            request: self.request.clone(),
            invocations: self.invocations,
            resumptions: self.resumptions,
            last_result: self.last_result.clone(),
        }
    }

    fn boxed_context(&self) -> Box<RunContext> {
        Box::new(self.context())
    }
}

/// Runs transfers end to end.
///
/// Holds no per-run state, so one instance can be shared behind an `Arc` and
/// drive any number of independent requests concurrently.
#[derive(Clone)]
pub struct TransferOrchestrator {
    guard: IdempotencyGuard,
    gateway: NotificationGateway,
    invoker: WorkerInvoker,
    settings: InvocationSettings,
    limits: TransitionLimits,
}

impl TransferOrchestrator {
    pub fn new(
        guard: IdempotencyGuard,
        gateway: NotificationGateway,
        invoker: WorkerInvoker,
        settings: InvocationSettings,
        limits: TransitionLimits,
    ) -> Self {
        Self {
            guard,
            gateway,
            invoker,
            settings,
            limits,
        }
    }

    pub fn limits(&self) -> &TransitionLimits {
        &self.limits
    }

    pub fn settings(&self) -> &InvocationSettings {
        &self.settings
    }

    /// Run a transfer to completion.
    ///
    /// Returns the outcome when the worker reports completion. Every failure
    /// path has already published its notification when this returns `Err`,
    /// except [`OrchestratorError::Notification`] itself.
    pub async fn run(&self, request: TransferRequest) -> Result<TransferOutcome, OrchestratorError> {
        let mut run = RunTracker::new(request);
        info!(
            run_id = %run.run_id,
            request_id = %run.request.id,
            source_url = %run.request.source_url,
            container = %run.request.destination.container,
            "Starting transfer"
        );

        let result = self.drive(&mut run).await;

        let elapsed = run.started.elapsed();
        metrics::TRANSFER_DURATION.observe(elapsed.as_secs_f64());
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.error_code(),
        };
        metrics::TRANSFERS_TOTAL.with_label_values(&[label]).inc();

        match &result {
            Ok(outcome) => info!(
                run_id = %run.run_id,
                request_id = %outcome.request_id,
                invocations = outcome.invocations,
                resumptions = outcome.resumptions,
                duration_ms = outcome.duration_ms,
                "Transfer complete"
            ),
            Err(e) if e.is_precondition_failure() => warn!(
                run_id = %run.run_id,
                request_id = %run.request.id,
                code = e.error_code(),
                "Transfer not started: {}",
                e
            ),
            Err(e) => error!(
                run_id = %run.run_id,
                request_id = %run.request.id,
                code = e.error_code(),
                invocations = run.invocations,
                resumptions = run.resumptions,
                "Transfer failed: {}",
                e
            ),
        }

        result
    }

    /// Run a transfer, aborting when `shutdown` flips to `true`.
    ///
    /// Cancellation drops the in-flight step, including any backoff sleep,
    /// and publishes a failure notification before returning
    /// [`OrchestratorError::Cancelled`].
    pub async fn run_until_cancelled(
        &self,
        request: TransferRequest,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<TransferOutcome, OrchestratorError> {
        if *shutdown.borrow() {
            return Err(OrchestratorError::Cancelled);
        }

        let request_id = request.id.clone();
        tokio::select! {
            result = self.run(request) => result,
            _ = wait_for_shutdown(&mut shutdown) => {
                warn!(request_id = %request_id, "Transfer cancelled by shutdown");
                metrics::TRANSFERS_TOTAL.with_label_values(&["cancelled"]).inc();

                let event = NotificationEvent::error(
                    LifecycleStage::Failed,
                    request_id.as_str(),
                    "transfer cancelled",
                    json!({ "reason": "cancelled" }),
                );
                if let Err(e) = self.gateway.publish(event).await {
                    warn!(request_id = %request_id, "Failed to publish cancellation: {}", e);
                }
                Err(OrchestratorError::Cancelled)
            }
        }
    }

    async fn drive(&self, run: &mut RunTracker) -> Result<TransferOutcome, OrchestratorError> {
        let mut state = TransferState::Init;

        while !state.is_terminal() {
            let event = self.step(run, &state).await?;
            let from = state.name();
            let event_name = event.name();
            state = transition(state, event, &self.limits)?;
            debug!(
                run_id = %run.run_id,
                from,
                event = event_name,
                to = state.name(),
                "Transfer state changed"
            );
        }

        self.finish(run, state)
    }

    /// Perform the side effect of `state` and report its outcome.
    async fn step(
        &self,
        run: &mut RunTracker,
        state: &TransferState,
    ) -> Result<StepEvent, OrchestratorError> {
        let event = match state {
            TransferState::Init => match run.request.validate() {
                Ok(()) => StepEvent::Proceed,
                Err(e) => StepEvent::RequestRejected {
                    message: e.to_string(),
                },
            },

            TransferState::CheckDestination => {
                let container = &run.request.destination.container;
                let prefix = run.request.listing_prefix();
                match self.guard.check_destination_empty(container, &prefix).await {
                    Ok(empty) => StepEvent::DestinationChecked { empty },
                    Err(e) => StepEvent::DestinationCheckFailed {
                        message: e.to_string(),
                    },
                }
            }

            TransferState::NotifyPreconditionFailure { cause } => {
                let event = NotificationEvent::error(
                    LifecycleStage::PreconditionFailed,
                    run.request.id.as_str(),
                    precondition_message(cause),
                    json!({
                        "run_id": run.run_id,
                        "cause": cause,
                        "container": run.request.destination.container,
                        "prefix": run.request.destination_prefix(),
                    }),
                );
                self.gateway.publish(event).await?;
                StepEvent::Published
            }

            TransferState::NotifyStart => {
                let event = NotificationEvent::info(
                    LifecycleStage::Started,
                    run.request.id.as_str(),
                    "transfer initiating",
                    json!({
                        "run_id": run.run_id,
                        "source_url": run.request.source_url,
                        "container": run.request.destination.container,
                        "prefix": run.request.destination_prefix(),
                    }),
                );
                self.gateway.publish(event).await?;
                StepEvent::Published
            }

            TransferState::Invoke { sequence } => {
                let invocation = WorkerInvocation::for_request(&run.request, *sequence, &self.settings);
                run.invocations = run.invocations.saturating_add(1);
                info!(
                    run_id = %run.run_id,
                    request_id = %run.request.id,
                    sequence,
                    "Invoking worker"
                );
                match self.invoker.invoke(&invocation).await {
                    Ok(result) => {
                        run.last_result = Some(result.clone());
                        StepEvent::WorkerReturned { result }
                    }
                    Err(e) => StepEvent::InvocationFailed {
                        attempts: e.attempts,
                        message: e.source.to_string(),
                    },
                }
            }

            TransferState::Evaluate { .. } => StepEvent::Proceed,

            TransferState::NotifyProgress { sequence, result } => {
                run.resumptions = run.resumptions.saturating_add(1);
                metrics::RESUMPTIONS.inc();
                info!(
                    run_id = %run.run_id,
                    request_id = %run.request.id,
                    sequence,
                    resumptions = run.resumptions,
                    "Worker needs another invocation"
                );
                let event = NotificationEvent::info(
                    LifecycleStage::Progress,
                    run.request.id.as_str(),
                    format!("transfer resuming after invocation {}", sequence),
                    json!({
                        "run_id": run.run_id,
                        "sequence": sequence,
                        "progress": result.progress,
                    }),
                );
                self.gateway.publish(event).await?;
                StepEvent::Published
            }

            TransferState::NotifySuccess { sequence, result } => {
                let event = NotificationEvent::info(
                    LifecycleStage::Succeeded,
                    run.request.id.as_str(),
                    "transfer complete",
                    json!({
                        "run_id": run.run_id,
                        "invocations": sequence,
                        "resumptions": run.resumptions,
                        "progress": result.progress,
                        "asset": result.asset_metadata,
                    }),
                );
                self.gateway.publish(event).await?;
                StepEvent::Published
            }

            TransferState::NotifyFailure { cause, .. } => {
                let event = NotificationEvent::error(
                    LifecycleStage::Failed,
                    run.request.id.as_str(),
                    failure_message(cause),
                    failure_payload(cause, &run.context()),
                );
                self.gateway.publish(event).await?;
                StepEvent::Published
            }

            TransferState::PreconditionFailed { .. }
            | TransferState::Done { .. }
            | TransferState::DownloadFailed { .. } => {
                return Err(TransitionError::Terminal(state.name()).into());
            }
        };

        Ok(event)
    }

    /// Map a terminal state onto the run's result.
    fn finish(
        &self,
        run: &RunTracker,
        state: TransferState,
    ) -> Result<TransferOutcome, OrchestratorError> {
        match state {
            TransferState::Done { sequence, result } => Ok(TransferOutcome {
                run_id: run.run_id.clone(),
                request_id: run.request.id.clone(),
                destination_prefix: run.request.destination_prefix(),
                invocations: sequence,
                resumptions: run.resumptions,
                progress: result.progress,
                asset_metadata: result.asset_metadata,
                duration_ms: run.started.elapsed().as_millis() as u64,
            }),

            TransferState::PreconditionFailed { cause } => Err(match cause {
                PreconditionCause::InvalidRequest { message } => {
                    OrchestratorError::InvalidRequest(message)
                }
                PreconditionCause::DestinationOccupied => OrchestratorError::DestinationOccupied {
                    container: run.request.destination.container.clone(),
                    prefix: run.request.listing_prefix(),
                },
                PreconditionCause::DestinationCheckFailed { message } => {
                    OrchestratorError::DestinationCheckFailed(message)
                }
            }),

            TransferState::DownloadFailed { cause, .. } => Err(match cause {
                FailureCause::WorkerReported { result } => OrchestratorError::WorkerFailed {
                    status: result.reported_status,
                    context: run.boxed_context(),
                },
                FailureCause::InvocationFailed { attempts, message } => {
                    OrchestratorError::InvocationFailed {
                        attempts,
                        message,
                        context: run.boxed_context(),
                    }
                }
                FailureCause::ResumptionLimitExceeded { limit, .. } => {
                    OrchestratorError::ResumptionLimitExceeded {
                        limit,
                        context: run.boxed_context(),
                    }
                }
            }),

            other => Err(TransitionError::Unexpected {
                state: other.name(),
                event: "finish",
            }
            .into()),
        }
    }
}

/// Resolve once the shutdown flag is set. A dropped sender never cancels.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn precondition_message(cause: &PreconditionCause) -> String {
    match cause {
        PreconditionCause::InvalidRequest { message } => {
            format!("transfer rejected: {}", message)
        }
        PreconditionCause::DestinationOccupied => {
            "transfer not started: destination already contains objects".to_string()
        }
        PreconditionCause::DestinationCheckFailed { message } => {
            format!("transfer not started: destination check failed: {}", message)
        }
    }
}

fn failure_message(cause: &FailureCause) -> String {
    match cause {
        FailureCause::WorkerReported { result } => {
            format!("transfer failed: worker reported '{}'", result.reported_status)
        }
        FailureCause::InvocationFailed { attempts, message } => format!(
            "transfer failed: worker unreachable after {} attempt(s): {}",
            attempts, message
        ),
        FailureCause::ResumptionLimitExceeded { limit, .. } => {
            format!("transfer failed: exceeded {} resumptions", limit)
        }
    }
}

/// Failure payload: the cause plus the full run context for postmortems.
fn failure_payload(cause: &FailureCause, context: &RunContext) -> Value {
    json!({
        "reason": cause.code(),
        "cause": cause,
        "context": context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::PublishFailurePolicy;
    use crate::testing::{fixtures, MockNotifier, MockObjectStore, MockWorker};
    use crate::transfer::{Destination, NotificationKind, WorkerStatus};
    use crate::worker::{RetryPolicy, WorkerError};

    struct Harness {
        store: Arc<MockObjectStore>,
        notifier: Arc<MockNotifier>,
        worker: Arc<MockWorker>,
        orchestrator: TransferOrchestrator,
    }

    fn harness(limits: TransitionLimits, policy: PublishFailurePolicy) -> Harness {
        let store = Arc::new(MockObjectStore::new());
        let notifier = Arc::new(MockNotifier::new());
        let worker = Arc::new(MockWorker::new());
        let orchestrator = TransferOrchestrator::new(
            IdempotencyGuard::new(store.clone()),
            NotificationGateway::new(notifier.clone(), "vod-migrator", policy),
            WorkerInvoker::new(worker.clone(), RetryPolicy::default()),
            InvocationSettings::default(),
            limits,
        );
        Harness {
            store,
            notifier,
            worker,
            orchestrator,
        }
    }

    fn default_harness() -> Harness {
        harness(TransitionLimits::default(), PublishFailurePolicy::BestEffort)
    }

    #[tokio::test]
    async fn test_complete_on_first_invocation() {
        let h = default_harness();
        h.worker.always_respond(fixtures::complete_response()).await;

        let outcome = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap();

        assert_eq!(outcome.request_id, "asset-1");
        assert_eq!(outcome.invocations, 1);
        assert_eq!(outcome.resumptions, 0);
        assert_eq!(
            h.notifier.stages().await,
            vec![LifecycleStage::Started, LifecycleStage::Succeeded]
        );
    }

    #[tokio::test]
    async fn test_occupied_destination_never_invokes_worker() {
        let h = default_harness();
        let request = fixtures::transfer_request("asset-1");
        h.store
            .insert(&request.destination.container, &format!("{}/index.m3u8", request.destination_prefix()))
            .await;

        let err = h.orchestrator.run(request).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::DestinationOccupied { .. }));
        assert_eq!(err.error_code(), "destination_occupied");
        assert_eq!(h.worker.call_count().await, 0);

        let published = h.notifier.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event.kind, NotificationKind::Error);
        assert_eq!(published[0].event.stage, LifecycleStage::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_sibling_prefix_does_not_block() {
        let h = default_harness();
        h.worker.always_respond(fixtures::complete_response()).await;
        let request = TransferRequest::new(
            "dash_compact",
            "https://origin.example.com/dash/manifest.mpd",
            Destination::new("media", "vod"),
        );
        h.store
            .insert("media", "vod/dash_compact_iframe/manifest.mpd")
            .await;

        let outcome = h.orchestrator.run(request).await.unwrap();
        assert_eq!(outcome.invocations, 1);
    }

    #[tokio::test]
    async fn test_invalid_request_is_precondition_failure() {
        let h = default_harness();
        let request = TransferRequest::new("asset-1", "ftp://origin/a.m3u8", Destination::new("media", ""));

        let err = h.orchestrator.run(request).await.unwrap_err();

        assert_eq!(err.error_code(), "invalid_request");
        assert!(err.is_precondition_failure());
        assert!(h.store.list_calls().await.is_empty());
        assert_eq!(h.worker.call_count().await, 0);
        assert_eq!(h.notifier.stages().await, vec![LifecycleStage::PreconditionFailed]);
    }

    #[tokio::test]
    async fn test_listing_failure_refuses_to_start() {
        let h = default_harness();
        h.store
            .set_next_error(crate::guard::StorageError::Backend("denied".into()))
            .await;

        let err = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "destination_check_failed");
        assert_eq!(h.worker.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_continuations_reinvoke_with_incrementing_sequence() {
        let h = default_harness();
        h.worker.push_response(fixtures::timeout_response()).await;
        h.worker.push_response(fixtures::timeout_response()).await;
        h.worker.push_response(fixtures::complete_response()).await;

        let outcome = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap();

        assert_eq!(outcome.invocations, 3);
        assert_eq!(outcome.resumptions, 2);

        let sequences: Vec<u32> = h
            .worker
            .calls()
            .await
            .iter()
            .map(|c| c.request.attempt_sequence_number)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(h.notifier.count_stage(LifecycleStage::Progress).await, 2);
        assert_eq!(h.notifier.count_stage(LifecycleStage::Failed).await, 0);
    }

    #[tokio::test]
    async fn test_business_failure_carries_last_result() {
        let h = default_harness();
        h.worker.always_respond(fixtures::failed_response("INCOMPLETE")).await;

        let err = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "worker_failed");
        let context = err.debug_context().unwrap();
        let last = context.last_result.as_ref().unwrap();
        assert_eq!(last.status, WorkerStatus::Failed);
        assert_eq!(last.debug_context, fixtures::failed_response("INCOMPLETE").to_value());
        assert_eq!(h.worker.call_count().await, 1);

        let failures = h.notifier.events_for_stage(LifecycleStage::Failed).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].payload["reason"], "worker_failed");
        assert_eq!(
            failures[0].payload["context"]["last_result"]["reported_status"],
            "INCOMPLETE"
        );
    }

    #[tokio::test]
    async fn test_resumption_limit_fails_run() {
        let h = harness(
            TransitionLimits {
                max_resumptions: Some(1),
            },
            PublishFailurePolicy::BestEffort,
        );
        h.worker.always_respond(fixtures::timeout_response()).await;

        let err = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::ResumptionLimitExceeded { limit: 1, .. }
        ));
        assert_eq!(h.worker.call_count().await, 2);
        assert_eq!(h.notifier.count_stage(LifecycleStage::Progress).await, 1);
        assert_eq!(h.notifier.count_stage(LifecycleStage::Failed).await, 1);
    }

    #[tokio::test]
    async fn test_fatal_publish_policy_aborts() {
        let h = harness(TransitionLimits::default(), PublishFailurePolicy::Fatal);
        h.worker.always_respond(fixtures::complete_response()).await;
        h.notifier.set_fail(true).await;

        let err = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "notification_failed");
        assert_eq!(h.worker.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_best_effort_publish_policy_completes() {
        let h = default_harness();
        h.worker.always_respond(fixtures::complete_response()).await;
        h.notifier.set_fail(true).await;

        let outcome = h
            .orchestrator
            .run(fixtures::transfer_request("asset-1"))
            .await
            .unwrap();

        assert_eq!(outcome.invocations, 1);
        assert_eq!(h.notifier.attempt_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let h = default_harness();
        h.worker
            .always_fail(WorkerError::ConnectionFailed("refused".into()))
            .await;
        let (tx, rx) = watch::channel(false);

        let orchestrator = h.orchestrator.clone();
        let handle = tokio::spawn(async move {
            orchestrator
                .run_until_cancelled(fixtures::transfer_request("asset-1"), rx)
                .await
        });

        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        tx.send(true).unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, OrchestratorError::Cancelled));
        assert_eq!(h.worker.call_count().await, 2);

        let failures = h.notifier.events_for_stage(LifecycleStage::Failed).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].payload["reason"], "cancelled");
    }

    #[tokio::test]
    async fn test_already_cancelled_does_nothing() {
        let h = default_harness();
        let (_tx, rx) = watch::channel(true);

        let err = h
            .orchestrator
            .run_until_cancelled(fixtures::transfer_request("asset-1"), rx)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Cancelled));
        assert!(h.notifier.published().await.is_empty());
    }
}
