//! Transfer orchestration.
//!
//! The orchestrator composes the idempotency guard, the notification gateway
//! and the worker invoker into the full migration protocol:
//!
//! 1. Refuse to start if the destination already holds output.
//! 2. Announce the start, then invoke the worker.
//! 3. While the worker reports it stopped early, announce progress and invoke
//!    it again with a fresh invocation.
//! 4. Announce success or failure and stop.
//!
//! The protocol itself lives in [`state`] as a pure transition function; the
//! [`TransferOrchestrator`] performs the side effects.

mod config;
mod runner;
pub mod state;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TransferOrchestrator;
pub use state::{
    transition, FailureCause, PreconditionCause, StepEvent, TransferState, TransitionError,
    TransitionLimits,
};
pub use types::{OrchestratorError, RunContext, TransferOutcome};
