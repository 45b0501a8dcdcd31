//! HTTP worker client.
//!
//! POSTs the JSON worker request to an invocation endpoint (a function URL or
//! an API gateway in front of the worker) and decodes the JSON reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::WorkerConfig;

use super::{Worker, WorkerError, WorkerRequest, WorkerResponse};

/// Worker reached over HTTP.
pub struct HttpWorker {
    client: Client,
    endpoint: String,
}

impl HttpWorker {
    /// Create a worker client. The timeout should exceed the worker's own
    /// execution limit so a slow but healthy invocation is not cut off.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl Worker for HttpWorker {
    fn name(&self) -> &str {
        "http"
    }

    async fn call(&self, request: &WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WorkerError::Timeout
                } else if e.is_connect() {
                    WorkerError::ConnectionFailed(e.to_string())
                } else {
                    WorkerError::ConnectionFailed(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(200).collect();
            return Err(classify_status(status, message));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                WorkerError::Timeout
            } else {
                WorkerError::ConnectionFailed(format!("failed to read response: {}", e))
            }
        })?;

        debug!(
            request_id = %request.request_id,
            attempt_sequence_number = request.attempt_sequence_number,
            bytes = body.len(),
            "Worker responded"
        );

        serde_json::from_str(&body).map_err(|e| WorkerError::InvalidResponse(e.to_string()))
    }
}

fn classify_status(status: StatusCode, message: String) -> WorkerError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        WorkerError::Throttled(message)
    } else if status.is_server_error() {
        WorkerError::Service {
            status: status.as_u16(),
            message,
        }
    } else {
        WorkerError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}
