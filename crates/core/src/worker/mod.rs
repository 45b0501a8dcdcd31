//! Bounded-execution worker access.
//!
//! This module provides the [`Worker`] trait for the external worker that
//! performs the actual segment copying, an HTTP implementation, and the
//! [`WorkerInvoker`] that wraps calls with exponential backoff.
//!
//! # Failure layers
//!
//! - [`WorkerError`]: the call itself failed (connection, timeout, throttling,
//!   platform errors). Retryable variants are retried by the invoker.
//! - A successful call whose `result.status` is neither `COMPLETE` nor
//!   `LAMBDA_TIMEOUT`: a business failure, returned untouched.
//!
//! # Example
//!
//! ```ignore
//! use vodmigrator_core::worker::{HttpWorker, RetryPolicy, WorkerInvoker};
//!
//! let worker = Arc::new(HttpWorker::from_config(&config.worker)?);
//! let invoker = WorkerInvoker::new(worker, RetryPolicy::from(&config.retry));
//! let result = invoker.invoke(&invocation).await?;
//! ```

mod error;
mod http;
mod invoker;
mod retry;
mod traits;
mod types;

pub use error::{InvocationError, WorkerError};
pub use http::HttpWorker;
pub use invoker::WorkerInvoker;
pub use retry::RetryPolicy;
pub use traits::Worker;
pub use types::{WorkerRequest, WorkerResponse};
