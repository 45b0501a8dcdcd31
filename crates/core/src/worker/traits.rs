//! Trait definitions for the worker module.

use async_trait::async_trait;

use super::error::WorkerError;
use super::types::{WorkerRequest, WorkerResponse};

/// A bounded-execution worker that copies part of an asset per call.
///
/// One call runs until the asset is complete or the worker's own time limit
/// is near, then returns. Working out what is already copied is the worker's
/// job; callers just call again after a continuation status.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Returns the name of this worker implementation.
    fn name(&self) -> &str;

    /// Runs one invocation. Errors are invocation-layer failures only.
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerResponse, WorkerError>;
}
