//! Transfer state machine.
//!
//! [`transition`] is pure: it maps the current state and the outcome of that
//! state's side effect to the next state. The runner performs the effects
//! (listing, publishing, invoking) and feeds their outcomes back in.
//!
//! ```text
//! Init ─► CheckDestination ─┬─► NotifyStart ─► Invoke(1) ─► Evaluate ─┬─► NotifySuccess ─► Done
//!   │                       │                    ▲                    ├─► NotifyProgress ─┐
//!   │                       │                    └────────────────────┼───────────────────┘
//!   │                       │                                         └─► NotifyFailure ─► DownloadFailed
//!   └───────────────────────┴─► NotifyPreconditionFailure ─► PreconditionFailed
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transfer::{WorkerResult, WorkerStatus};

/// Why a run stopped before invoking the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PreconditionCause {
    /// The request is missing fields or has an unusable source.
    InvalidRequest { message: String },
    /// Output already exists under the destination prefix.
    DestinationOccupied,
    /// The destination could not be listed.
    DestinationCheckFailed { message: String },
}

impl PreconditionCause {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::DestinationOccupied => "destination_occupied",
            Self::DestinationCheckFailed { .. } => "destination_check_failed",
        }
    }
}

/// Why a run stopped after the transfer began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureCause {
    /// The worker ran and reported a non-success status.
    WorkerReported { result: WorkerResult },
    /// The worker could not be called, after retries where allowed.
    InvocationFailed { attempts: u32, message: String },
    /// The worker kept asking for continuations past the configured cap.
    ResumptionLimitExceeded { limit: u32, result: WorkerResult },
}

impl FailureCause {
    pub fn code(&self) -> &'static str {
        match self {
            Self::WorkerReported { .. } => "worker_failed",
            Self::InvocationFailed { .. } => "invocation_failed",
            Self::ResumptionLimitExceeded { .. } => "resumption_limit_exceeded",
        }
    }
}

/// Limits the transition function enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionLimits {
    /// Maximum continuations before the run is failed. `None` = unbounded.
    pub max_resumptions: Option<u32>,
}

/// States of one transfer run.
///
/// `sequence` is the 1-based number of the worker invocation the state
/// belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferState {
    Init,
    CheckDestination,
    NotifyPreconditionFailure { cause: PreconditionCause },
    NotifyStart,
    Invoke { sequence: u32 },
    Evaluate { sequence: u32, result: WorkerResult },
    NotifyProgress { sequence: u32, result: WorkerResult },
    NotifySuccess { sequence: u32, result: WorkerResult },
    NotifyFailure { sequence: u32, cause: FailureCause },
    PreconditionFailed { cause: PreconditionCause },
    Done { sequence: u32, result: WorkerResult },
    DownloadFailed { sequence: u32, cause: FailureCause },
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CheckDestination => "check_destination",
            Self::NotifyPreconditionFailure { .. } => "notify_precondition_failure",
            Self::NotifyStart => "notify_start",
            Self::Invoke { .. } => "invoke",
            Self::Evaluate { .. } => "evaluate",
            Self::NotifyProgress { .. } => "notify_progress",
            Self::NotifySuccess { .. } => "notify_success",
            Self::NotifyFailure { .. } => "notify_failure",
            Self::PreconditionFailed { .. } => "precondition_failed",
            Self::Done { .. } => "done",
            Self::DownloadFailed { .. } => "download_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::PreconditionFailed { .. } | Self::Done { .. } | Self::DownloadFailed { .. }
        )
    }
}

/// Outcome of the side effect performed in a state.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A state without external input finished (`Init` after validation, `Evaluate`).
    Proceed,
    /// `Init`: the request failed validation.
    RequestRejected { message: String },
    /// `CheckDestination`: listing finished.
    DestinationChecked { empty: bool },
    /// `CheckDestination`: listing failed.
    DestinationCheckFailed { message: String },
    /// A notify state published its event (or best-effort skipped a failure).
    Published,
    /// `Invoke`: the worker returned a response.
    WorkerReturned { result: WorkerResult },
    /// `Invoke`: the invoker gave up.
    InvocationFailed { attempts: u32, message: String },
}

impl StepEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::RequestRejected { .. } => "request_rejected",
            Self::DestinationChecked { .. } => "destination_checked",
            Self::DestinationCheckFailed { .. } => "destination_check_failed",
            Self::Published => "published",
            Self::WorkerReturned { .. } => "worker_returned",
            Self::InvocationFailed { .. } => "invocation_failed",
        }
    }
}

/// A state received an event it has no transition for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no transition from state '{state}' on event '{event}'")]
    Unexpected {
        state: &'static str,
        event: &'static str,
    },

    #[error("state '{0}' is terminal")]
    Terminal(&'static str),
}

/// Compute the next state.
pub fn transition(
    state: TransferState,
    event: StepEvent,
    limits: &TransitionLimits,
) -> Result<TransferState, TransitionError> {
    use StepEvent as E;
    use TransferState as S;

    if state.is_terminal() {
        return Err(TransitionError::Terminal(state.name()));
    }

    let next = match (state, event) {
        (S::Init, E::Proceed) => S::CheckDestination,
        (S::Init, E::RequestRejected { message }) => S::NotifyPreconditionFailure {
            cause: PreconditionCause::InvalidRequest { message },
        },

        (S::CheckDestination, E::DestinationChecked { empty: true }) => S::NotifyStart,
        (S::CheckDestination, E::DestinationChecked { empty: false }) => {
            S::NotifyPreconditionFailure {
                cause: PreconditionCause::DestinationOccupied,
            }
        }
        (S::CheckDestination, E::DestinationCheckFailed { message }) => {
            S::NotifyPreconditionFailure {
                cause: PreconditionCause::DestinationCheckFailed { message },
            }
        }

        (S::NotifyPreconditionFailure { cause }, E::Published) => S::PreconditionFailed { cause },

        (S::NotifyStart, E::Published) => S::Invoke { sequence: 1 },

        (S::Invoke { sequence }, E::WorkerReturned { result }) => S::Evaluate { sequence, result },
        (S::Invoke { sequence }, E::InvocationFailed { attempts, message }) => S::NotifyFailure {
            sequence,
            cause: FailureCause::InvocationFailed { attempts, message },
        },

        (S::Evaluate { sequence, result }, E::Proceed) => match result.status {
            WorkerStatus::Complete => S::NotifySuccess { sequence, result },
            WorkerStatus::ContinuationNeeded => match limits.max_resumptions {
                Some(limit) if sequence > limit => S::NotifyFailure {
                    sequence,
                    cause: FailureCause::ResumptionLimitExceeded { limit, result },
                },
                _ => S::NotifyProgress { sequence, result },
            },
            WorkerStatus::Failed => S::NotifyFailure {
                sequence,
                cause: FailureCause::WorkerReported { result },
            },
        },

        (S::NotifyProgress { sequence, .. }, E::Published) => S::Invoke {
            sequence: sequence.saturating_add(1),
        },
        (S::NotifySuccess { sequence, result }, E::Published) => S::Done { sequence, result },
        (S::NotifyFailure { sequence, cause }, E::Published) => S::DownloadFailed { sequence, cause },

        (state, event) => {
            return Err(TransitionError::Unexpected {
                state: state.name(),
                event: event.name(),
            })
        }
    };

    Ok(next)
}
