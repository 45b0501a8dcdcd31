//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits, so
//! full transfers can be exercised without a worker, storage or a
//! notification service.
//!
//! # Example
//!
//! ```rust,ignore
//! use vodmigrator_core::testing::{fixtures, MockNotifier, MockObjectStore, MockWorker};
//!
//! let store = Arc::new(MockObjectStore::new());
//! let notifier = Arc::new(MockNotifier::new());
//! let worker = Arc::new(MockWorker::new());
//!
//! // Configure mock responses
//! worker.push_response(fixtures::timeout_response()).await;
//! worker.always_respond(fixtures::complete_response()).await;
//!
//! // Build a TransferOrchestrator from them...
//! ```

mod http_stub;
mod mock_notifier;
mod mock_object_store;
mod mock_worker;

pub use http_stub::{RecordedRequest, StubHttpServer, StubResponse};
pub use mock_notifier::{MockNotifier, PublishedNotification};
pub use mock_object_store::MockObjectStore;
pub use mock_worker::{MockWorker, RecordedCall, ScriptedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Map, Value};

    use crate::transfer::{Destination, TransferRequest, WorkerStatus};
    use crate::worker::WorkerResponse;

    /// Create a transfer request into the `media` container under `vod/`.
    pub fn transfer_request(id: &str) -> TransferRequest {
        TransferRequest::new(
            id,
            format!("https://origin.example.com/vod/{}/index.m3u8", id),
            Destination::new("media", "vod"),
        )
    }

    /// Build a worker response with the given status and progress counters.
    pub fn worker_response(status: &str, progress_percentage: f64) -> WorkerResponse {
        let mut result = Map::new();
        result.insert("status".to_string(), json!(status));
        result.insert(
            "progressPercentage".to_string(),
            json!(format!("{:.1}", progress_percentage)),
        );
        result.insert("resourcesFound".to_string(), json!(120));

        WorkerResponse {
            result: Value::Object(result),
            asset: json!({
                "type": "hls",
                "masterManifest": "index.m3u8",
                "variants": 3,
            }),
            extra: Map::new(),
        }
    }

    /// The worker finished the asset.
    pub fn complete_response() -> WorkerResponse {
        worker_response(WorkerStatus::COMPLETE, 100.0)
    }

    /// The worker stopped early and needs another invocation.
    pub fn timeout_response() -> WorkerResponse {
        worker_response(WorkerStatus::CONTINUATION, 50.0)
    }

    /// The worker ran and reported `status`, with its own error fields.
    pub fn failed_response(status: &str) -> WorkerResponse {
        let mut response = worker_response(status, 12.5);
        response
            .extra
            .insert("message".to_string(), Value::from("segment fetch failed"));
        response
    }
}
