//! Notification gateway used by the orchestrator.

use std::sync::Arc;

use tracing::{error, warn};

use crate::config::PublishFailurePolicy;
use crate::metrics;
use crate::transfer::NotificationEvent;

use super::{Notifier, NotifyError};

/// Publishes lifecycle events to one topic, applying the publish failure policy.
///
/// Publishing is synchronous and never retried. Safe to share between
/// concurrent runs.
#[derive(Clone)]
pub struct NotificationGateway {
    notifier: Arc<dyn Notifier>,
    topic: String,
    policy: PublishFailurePolicy,
}

impl NotificationGateway {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        topic: impl Into<String>,
        policy: PublishFailurePolicy,
    ) -> Self {
        Self {
            notifier,
            topic: topic.into(),
            policy,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn policy(&self) -> PublishFailurePolicy {
        self.policy
    }

    /// Publish an event.
    ///
    /// Under [`PublishFailurePolicy::BestEffort`] a failed publish is logged
    /// and reported as success; under [`PublishFailurePolicy::Fatal`] the
    /// error is returned to the caller.
    pub async fn publish(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let stage = event.stage.as_str();
        match self.notifier.publish(&self.topic, &event).await {
            Ok(()) => {
                metrics::NOTIFICATIONS_PUBLISHED
                    .with_label_values(&[stage, "success"])
                    .inc();
                Ok(())
            }
            Err(e) => {
                metrics::NOTIFICATIONS_PUBLISHED
                    .with_label_values(&[stage, "error"])
                    .inc();
                match self.policy {
                    PublishFailurePolicy::BestEffort => {
                        warn!(
                            topic = %self.topic,
                            notifier = self.notifier.name(),
                            request_id = %event.request_id,
                            stage,
                            "Failed to publish notification, continuing: {}",
                            e
                        );
                        Ok(())
                    }
                    PublishFailurePolicy::Fatal => {
                        error!(
                            topic = %self.topic,
                            notifier = self.notifier.name(),
                            request_id = %event.request_id,
                            stage,
                            "Failed to publish notification: {}",
                            e
                        );
                        Err(e)
                    }
                }
            }
        }
    }
}
