use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::transfer::InvocationSettings;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub worker: WorkerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Bounded-execution worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// HTTP endpoint that runs one bounded worker invocation
    pub endpoint: String,
    /// Client-side timeout for a single call (default: 900s, the worker platform maximum)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Concurrent segment fetchers inside the worker
    #[serde(default = "default_thread_count")]
    pub thread_count: u32,
    /// Origin request rate limit inside the worker (0 = unthrottled)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_second: u32,
    #[serde(default)]
    pub verbose: bool,
}

impl WorkerConfig {
    pub fn invocation_settings(&self) -> InvocationSettings {
        InvocationSettings {
            thread_count: self.thread_count,
            rate_limit_per_second: self.rate_limit_per_second,
            verbose: self.verbose,
        }
    }
}

fn default_request_timeout() -> u64 {
    900
}

fn default_thread_count() -> u32 {
    5
}

fn default_rate_limit() -> u32 {
    1000
}

/// Retry policy for invocation-layer failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound on any single backoff delay
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_initial_delay() -> u64 {
    2000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> u64 {
    300_000
}

fn default_max_attempts() -> u32 {
    6
}

/// Destination storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per container
    pub root: PathBuf,
}

/// Notification channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub backend: NotifierBackend,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Required when backend = "webhook"
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub publish_failure: PublishFailurePolicy,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backend: NotifierBackend::default(),
            topic: default_topic(),
            webhook_url: None,
            timeout_secs: default_webhook_timeout(),
            publish_failure: PublishFailurePolicy::default(),
        }
    }
}

fn default_topic() -> String {
    "vod-migrator".to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Available notification backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifierBackend {
    /// Write events to the log only
    #[default]
    Log,
    /// POST events as JSON to `webhook_url`
    Webhook,
}

/// What a failed publish does to the run
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishFailurePolicy {
    /// Log and keep going
    #[default]
    BestEffort,
    /// Abort the run
    Fatal,
}

/// Sanitized config for logging (webhook URL redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub worker: WorkerConfig,
    pub storage: StorageConfig,
    pub retry: RetryConfig,
    pub notifications: SanitizedNotificationConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Sanitized notification config (webhook URL may embed a token)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotificationConfig {
    pub backend: String,
    pub topic: String,
    pub webhook_configured: bool,
    pub timeout_secs: u64,
    pub publish_failure: PublishFailurePolicy,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let notifications = &config.notifications;
        Self {
            worker: config.worker.clone(),
            storage: config.storage.clone(),
            retry: config.retry.clone(),
            notifications: SanitizedNotificationConfig {
                backend: match notifications.backend {
                    NotifierBackend::Log => "log".to_string(),
                    NotifierBackend::Webhook => "webhook".to_string(),
                },
                topic: notifications.topic.clone(),
                webhook_configured: notifications
                    .webhook_url
                    .as_ref()
                    .is_some_and(|u| !u.is_empty()),
                timeout_secs: notifications.timeout_secs,
                publish_failure: notifications.publish_failure,
            },
            orchestrator: config.orchestrator.clone(),
        }
    }
}
