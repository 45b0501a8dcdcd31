//! Wire types for the bounded-execution worker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transfer::{WorkerInvocation, WorkerResult, WorkerStatus};

/// Payload sent to the worker for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub thread_count: u32,
    pub destination_container: String,
    pub destination_prefix: String,
    pub verbose: bool,
    pub source_url: String,
    pub rate_limit_per_second: u32,
    /// Correlation only; the worker does not need it to resume.
    pub request_id: String,
    pub attempt_sequence_number: u32,
}

impl From<&WorkerInvocation> for WorkerRequest {
    fn from(invocation: &WorkerInvocation) -> Self {
        Self {
            thread_count: invocation.thread_count,
            destination_container: invocation.destination_container.clone(),
            destination_prefix: invocation.destination_prefix.clone(),
            verbose: invocation.verbose,
            source_url: invocation.source_url.clone(),
            rate_limit_per_second: invocation.rate_limit,
            request_id: invocation.request_id.clone(),
            attempt_sequence_number: invocation.attempt_sequence_number,
        }
    }
}

/// Raw worker reply: `{result: {status, ...progress}, asset, ...}`.
///
/// Fields outside `result` and `asset` (such as the worker's own `status`
/// code and `message`) are kept so they reach the debug context. A `result`
/// that is not an object still decodes and reads as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub asset: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkerResponse {
    /// Status string inside `result`, empty when missing or not a string.
    pub fn reported_status(&self) -> &str {
        self.result
            .as_object()
            .and_then(|result| result.get("status"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The response as a single JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("result".to_string(), self.result.clone());
        object.insert("asset".to_string(), self.asset.clone());
        Value::Object(object)
    }
}

impl From<WorkerResponse> for WorkerResult {
    fn from(response: WorkerResponse) -> Self {
        let reported_status = response.reported_status().to_string();
        let debug_context = response.to_value();

        let progress = match response.result {
            Value::Object(mut result) => {
                result.remove("status");
                result
            }
            _ => Map::new(),
        };

        Self {
            status: WorkerStatus::from_reported(&reported_status),
            reported_status,
            progress: Value::Object(progress),
            asset_metadata: response.asset,
            debug_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{Destination, InvocationSettings, TransferRequest};
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = TransferRequest::new(
            "asset-1",
            "https://origin/index.m3u8",
            Destination::new("media", "vod"),
        );
        let invocation = WorkerInvocation::for_request(&request, 2, &InvocationSettings::default());

        let value = serde_json::to_value(WorkerRequest::from(&invocation)).unwrap();
        assert_eq!(
            value,
            json!({
                "threadCount": 5,
                "destinationContainer": "media",
                "destinationPrefix": "vod/asset-1",
                "verbose": false,
                "sourceUrl": "https://origin/index.m3u8",
                "rateLimitPerSecond": 1000,
                "requestId": "asset-1",
                "attemptSequenceNumber": 2
            })
        );
    }

    #[test]
    fn test_response_to_result_complete() {
        let raw = json!({
            "status": 200,
            "message": "COMPLETE",
            "result": {
                "status": "COMPLETE",
                "totalDownloadedSegments": 120,
                "progressPercentage": "100.0"
            },
            "asset": {"s3Location": "s3://media/vod/asset-1/index.m3u8", "type": "hls"}
        });
        let response: WorkerResponse = serde_json::from_value(raw.clone()).unwrap();
        let result = WorkerResult::from(response);

        assert_eq!(result.status, WorkerStatus::Complete);
        assert_eq!(result.reported_status, "COMPLETE");
        assert_eq!(
            result.progress,
            json!({"totalDownloadedSegments": 120, "progressPercentage": "100.0"})
        );
        assert_eq!(result.asset_metadata["type"], "hls");
        assert_eq!(result.debug_context, raw);
    }

    #[test]
    fn test_response_without_status_is_failure() {
        let response: WorkerResponse = serde_json::from_value(json!({"message": "boom"})).unwrap();
        let result = WorkerResult::from(response);

        assert_eq!(result.status, WorkerStatus::Failed);
        assert_eq!(result.reported_status, "");
        assert_eq!(result.asset_metadata, Value::Null);
        assert_eq!(result.debug_context["message"], "boom");
    }

    #[test]
    fn test_non_object_result_is_failure_with_raw_context() {
        for raw in [
            json!({"result": null, "errorMessage": "boom"}),
            json!({"result": "Task timed out", "errorType": "Runtime.ExitError"}),
            json!({"result": ["partial"]}),
        ] {
            let response: WorkerResponse = serde_json::from_value(raw.clone()).unwrap();
            let result = WorkerResult::from(response);

            assert_eq!(result.status, WorkerStatus::Failed);
            assert_eq!(result.reported_status, "");
            assert_eq!(result.progress, json!({}));
            assert_eq!(result.debug_context, raw);
        }
    }

    #[test]
    fn test_non_string_status_is_failure() {
        let response: WorkerResponse =
            serde_json::from_value(json!({"result": {"status": 500}})).unwrap();
        assert_eq!(WorkerResult::from(response).status, WorkerStatus::Failed);
    }
}
