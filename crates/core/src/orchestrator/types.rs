//! Types for the transfer orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::notify::NotifyError;
use crate::transfer::{TransferRequest, WorkerResult};

use super::state::TransitionError;

/// Errors that end a transfer run.
///
/// Precondition failures (`InvalidRequest`, `DestinationOccupied`,
/// `DestinationCheckFailed`) happen before the worker is ever invoked;
/// the rest happen after the transfer started.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request failed validation.
    #[error("invalid transfer request: {0}")]
    InvalidRequest(String),

    /// Output already exists at the destination.
    #[error("destination already occupied: {container}/{prefix}")]
    DestinationOccupied { container: String, prefix: String },

    /// The destination could not be listed, so the run refused to start.
    #[error("destination check failed: {0}")]
    DestinationCheckFailed(String),

    /// The worker ran and reported a failure status.
    #[error("worker reported failure status '{status}'")]
    WorkerFailed {
        status: String,
        context: Box<RunContext>,
    },

    /// The worker could not be invoked.
    #[error("worker invocation failed after {attempts} attempt(s): {message}")]
    InvocationFailed {
        attempts: u32,
        message: String,
        context: Box<RunContext>,
    },

    /// The worker asked for more continuations than allowed.
    #[error("transfer exceeded the limit of {limit} resumptions")]
    ResumptionLimitExceeded {
        limit: u32,
        context: Box<RunContext>,
    },

    /// A notification could not be published under the fatal publish policy.
    #[error("notification publish failed: {0}")]
    Notification(#[from] NotifyError),

    /// The run was cancelled by shutdown.
    #[error("transfer cancelled")]
    Cancelled,

    /// The state machine received an event it cannot handle.
    #[error("state machine error: {0}")]
    Transition(#[from] TransitionError),
}

impl OrchestratorError {
    /// Stable identifier for the failure cause.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::DestinationOccupied { .. } => "destination_occupied",
            Self::DestinationCheckFailed(_) => "destination_check_failed",
            Self::WorkerFailed { .. } => "worker_failed",
            Self::InvocationFailed { .. } => "invocation_failed",
            Self::ResumptionLimitExceeded { .. } => "resumption_limit_exceeded",
            Self::Notification(_) => "notification_failed",
            Self::Cancelled => "cancelled",
            Self::Transition(_) => "invalid_transition",
        }
    }

    /// Whether the run stopped before the worker was invoked.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::DestinationOccupied { .. }
                | Self::DestinationCheckFailed(_)
        )
    }

    /// Postmortem context for failures after the transfer started.
    pub fn debug_context(&self) -> Option<&RunContext> {
        match self {
            Self::WorkerFailed { context, .. }
            | Self::InvocationFailed { context, .. }
            | Self::ResumptionLimitExceeded { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Everything known about a run, attached to failures for postmortems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub request: TransferRequest,
    /// Worker invocations issued, counting each loop iteration once.
    pub invocations: u32,
    pub resumptions: u32,
    /// Last result the worker returned, if any.
    pub last_result: Option<WorkerResult>,
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub run_id: String,
    pub request_id: String,
    pub destination_prefix: String,
    pub invocations: u32,
    pub resumptions: u32,
    pub progress: Value,
    pub asset_metadata: Value,
    pub duration_ms: u64,
}
