//! Error types for worker invocation.

use thiserror::Error;

/// Invocation-layer failures: the call to the worker itself went wrong.
///
/// A worker that ran and reported a bad status is not an error here; that
/// arrives as a successful response and is judged by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// Could not reach the worker endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The call did not return within the client timeout.
    #[error("Request timeout")]
    Timeout,

    /// The worker platform is throttling invocations.
    #[error("Worker throttled: {0}")]
    Throttled(String),

    /// The worker platform failed to run the invocation.
    #[error("Worker service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The worker platform refused the request as malformed or unauthorized.
    #[error("Worker rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The worker answered with a body that is not a worker response.
    #[error("Invalid worker response: {0}")]
    InvalidResponse(String),

    /// Client setup or other local failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Whether the invoker should try the call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout | Self::Throttled(_) | Self::Service { .. }
        )
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connection_failed",
            Self::Timeout => "timeout",
            Self::Throttled(_) => "throttled",
            Self::Service { .. } => "service",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Internal(_) => "internal",
        }
    }
}

/// The invoker gave up on a call: retries ran out or the error was not retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Worker invocation failed after {attempts} attempt(s): {source}")]
pub struct InvocationError {
    pub attempts: u32,
    #[source]
    pub source: WorkerError,
}
