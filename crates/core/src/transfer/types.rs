//! Types for transfer requests, worker invocations and lifecycle events.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RequestError;

/// Storage location the asset is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Bucket or container name.
    pub container: String,
    /// Path prefix inside the container. May be empty.
    #[serde(default)]
    pub path_prefix: String,
}

impl Destination {
    pub fn new(container: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path_prefix: path_prefix.into(),
        }
    }
}

/// A request to migrate one VOD asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Asset identifier. Also the last segment of the destination prefix.
    pub id: String,
    /// Master manifest URL on the origin.
    pub source_url: String,
    /// Where the asset is written.
    pub destination: Destination,
}

impl TransferRequest {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>, destination: Destination) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            destination,
        }
    }

    /// Check that all mandatory fields are present and the source is fetchable.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.id.trim().is_empty() {
            return Err(RequestError::MissingField("id"));
        }
        // The id must be exactly one segment of the destination prefix.
        if self.id.contains('/') || self.id == "." || self.id == ".." {
            return Err(RequestError::InvalidId(self.id.clone()));
        }
        if self.destination.container.trim().is_empty() {
            return Err(RequestError::MissingField("destination.container"));
        }
        if self.source_url.trim().is_empty() {
            return Err(RequestError::MissingField("source_url"));
        }

        let url = Url::parse(&self.source_url).map_err(|e| RequestError::InvalidSourceUrl {
            url: self.source_url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(RequestError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Destination prefix for this asset: `path_prefix/id`, or just `id`.
    pub fn destination_prefix(&self) -> String {
        let base = self.destination.path_prefix.trim_matches('/');
        let id = self.id.trim_matches('/');
        if base.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", base, id)
        }
    }

    /// Prefix used when listing existing output.
    ///
    /// The trailing slash keeps `dash_compact` from matching objects written
    /// under `dash_compact_iframe`.
    pub fn listing_prefix(&self) -> String {
        format!("{}/", self.destination_prefix())
    }
}

/// Per-invocation tuning passed through to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSettings {
    pub thread_count: u32,
    pub rate_limit_per_second: u32,
    pub verbose: bool,
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            thread_count: 5,
            rate_limit_per_second: 1000,
            verbose: false,
        }
    }
}

/// One call to the bounded-execution worker.
///
/// Built fresh for every loop iteration. It carries no progress state: the
/// worker works out what is left by inspecting the destination itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub request_id: String,
    /// 1-based loop iteration. Transport retries reuse the same number.
    pub attempt_sequence_number: u32,
    pub thread_count: u32,
    pub rate_limit: u32,
    pub verbose: bool,
    pub source_url: String,
    pub destination_container: String,
    pub destination_prefix: String,
}

impl WorkerInvocation {
    pub fn for_request(
        request: &TransferRequest,
        attempt_sequence_number: u32,
        settings: &InvocationSettings,
    ) -> Self {
        Self {
            request_id: request.id.clone(),
            attempt_sequence_number,
            thread_count: settings.thread_count,
            rate_limit: settings.rate_limit_per_second,
            verbose: settings.verbose,
            source_url: request.source_url.clone(),
            destination_container: request.destination.container.clone(),
            destination_prefix: request.destination_prefix(),
        }
    }
}

/// Outcome the worker reported for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Every resource is present at the destination.
    Complete,
    /// The worker stopped before its time limit; invoke again.
    ContinuationNeeded,
    /// Any other reported status.
    Failed,
}

impl WorkerStatus {
    /// Wire value for a finished transfer.
    pub const COMPLETE: &'static str = "COMPLETE";
    /// Wire value the worker uses when it stopped early to avoid its timeout.
    pub const CONTINUATION: &'static str = "LAMBDA_TIMEOUT";

    /// Map a raw status string onto the three outcomes the orchestrator knows.
    pub fn from_reported(status: &str) -> Self {
        match status {
            Self::COMPLETE => Self::Complete,
            Self::CONTINUATION => Self::ContinuationNeeded,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::ContinuationNeeded => "continuation_needed",
            Self::Failed => "failed",
        }
    }
}

/// Evaluated worker reply. Payloads are opaque and only used for notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub status: WorkerStatus,
    /// Status string exactly as the worker sent it.
    pub reported_status: String,
    /// Worker progress counters (the `result` object without `status`).
    pub progress: Value,
    /// Worker asset description (the `asset` object).
    pub asset_metadata: Value,
    /// The full raw response, kept for postmortems.
    pub debug_context: Value,
}

/// Severity of a lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Info,
    Error,
}

/// Point in the lifecycle a notification is published from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    PreconditionFailed,
    Started,
    Progress,
    Succeeded,
    Failed,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreconditionFailed => "precondition_failed",
            Self::Started => "started",
            Self::Progress => "progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// A lifecycle event handed to the notification gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub stage: LifecycleStage,
    pub request_id: String,
    pub message: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn info(
        stage: LifecycleStage,
        request_id: impl Into<String>,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(NotificationKind::Info, stage, request_id, message, payload)
    }

    pub fn error(
        stage: LifecycleStage,
        request_id: impl Into<String>,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(NotificationKind::Error, stage, request_id, message, payload)
    }

    fn new(
        kind: NotificationKind,
        stage: LifecycleStage,
        request_id: impl Into<String>,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            stage,
            request_id: request_id.into(),
            message: message.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(id: &str, url: &str, container: &str, prefix: &str) -> TransferRequest {
        TransferRequest::new(id, url, Destination::new(container, prefix))
    }

    #[test]
    fn test_destination_prefix_joins_with_single_slash() {
        let req = request("asset-1", "https://origin/a.m3u8", "bucket", "vod/hls/");
        assert_eq!(req.destination_prefix(), "vod/hls/asset-1");
        assert_eq!(req.listing_prefix(), "vod/hls/asset-1/");
    }

    #[test]
    fn test_destination_prefix_without_path_prefix() {
        let req = request("asset-1", "https://origin/a.m3u8", "bucket", "");
        assert_eq!(req.destination_prefix(), "asset-1");

        let req = request("asset-1", "https://origin/a.m3u8", "bucket", "/");
        assert_eq!(req.destination_prefix(), "asset-1");
    }

    #[test]
    fn test_validate_accepts_https_source() {
        let req = request("asset-1", "https://origin.example.com/out/v1/index.m3u8", "bucket", "vod");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let req = request("", "https://origin/a.m3u8", "bucket", "vod");
        assert_eq!(req.validate(), Err(RequestError::MissingField("id")));

        let req = request("asset", "https://origin/a.m3u8", " ", "vod");
        assert_eq!(
            req.validate(),
            Err(RequestError::MissingField("destination.container"))
        );

        let req = request("asset", "", "bucket", "vod");
        assert_eq!(req.validate(), Err(RequestError::MissingField("source_url")));
    }

    #[test]
    fn test_validate_rejects_multi_segment_ids() {
        for id in ["asset-1/sub", "/asset-1", "asset-1/", ".", ".."] {
            let req = request(id, "https://origin/a.m3u8", "bucket", "vod");
            assert_eq!(req.validate(), Err(RequestError::InvalidId(id.to_string())));
        }

        let req = request("asset-1.v2", "https://origin/a.m3u8", "bucket", "vod");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let req = request("asset", "not a url", "bucket", "vod");
        assert!(matches!(
            req.validate(),
            Err(RequestError::InvalidSourceUrl { .. })
        ));

        let req = request("asset", "ftp://origin/a.m3u8", "bucket", "vod");
        assert_eq!(
            req.validate(),
            Err(RequestError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_invocation_for_request() {
        let req = request("asset-9", "https://origin/a.mpd", "bucket", "dash");
        let settings = InvocationSettings {
            thread_count: 8,
            rate_limit_per_second: 50,
            verbose: true,
        };

        let invocation = WorkerInvocation::for_request(&req, 3, &settings);
        assert_eq!(invocation.request_id, "asset-9");
        assert_eq!(invocation.attempt_sequence_number, 3);
        assert_eq!(invocation.thread_count, 8);
        assert_eq!(invocation.rate_limit, 50);
        assert!(invocation.verbose);
        assert_eq!(invocation.destination_container, "bucket");
        assert_eq!(invocation.destination_prefix, "dash/asset-9");
    }

    #[test]
    fn test_worker_status_from_reported() {
        assert_eq!(WorkerStatus::from_reported("COMPLETE"), WorkerStatus::Complete);
        assert_eq!(
            WorkerStatus::from_reported("LAMBDA_TIMEOUT"),
            WorkerStatus::ContinuationNeeded
        );
        assert_eq!(WorkerStatus::from_reported("INCOMPLETE"), WorkerStatus::Failed);
        assert_eq!(WorkerStatus::from_reported("complete"), WorkerStatus::Failed);
        assert_eq!(WorkerStatus::from_reported(""), WorkerStatus::Failed);
    }

    #[test]
    fn test_notification_event_serialization() {
        let event = NotificationEvent::error(
            LifecycleStage::Failed,
            "asset-1",
            "transfer failed",
            json!({"status": "INCOMPLETE"}),
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "ERROR");
        assert_eq!(value["stage"], "failed");
        assert_eq!(value["request_id"], "asset-1");
        assert_eq!(value["payload"]["status"], "INCOMPLETE");
    }
}
