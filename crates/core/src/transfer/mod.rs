//! Shared data model for a VOD transfer run.
//!
//! A [`TransferRequest`] is created once per run and never changes. Every
//! loop iteration builds a fresh [`WorkerInvocation`] from it; the worker's
//! reply becomes a [`WorkerResult`] that the orchestrator evaluates once and
//! then drops. Operators observe the run through [`NotificationEvent`]s.

mod error;
mod types;

pub use error::RequestError;
pub use types::{
    Destination, InvocationSettings, LifecycleStage, NotificationEvent, NotificationKind,
    TransferRequest, WorkerInvocation, WorkerResult, WorkerStatus,
};
