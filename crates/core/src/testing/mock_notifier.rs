//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{Notifier, NotifyError};
use crate::transfer::{LifecycleStage, NotificationEvent};

/// A notification the mock accepted.
#[derive(Debug, Clone)]
pub struct PublishedNotification {
    pub topic: String,
    pub event: NotificationEvent,
}

/// Mock implementation of the Notifier trait.
///
/// Records every accepted event. When set to fail, publish attempts are
/// counted but nothing is recorded.
#[derive(Debug)]
pub struct MockNotifier {
    published: Arc<RwLock<Vec<PublishedNotification>>>,
    attempts: Arc<RwLock<usize>>,
    fail: Arc<RwLock<bool>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    /// Create a new mock notifier.
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            attempts: Arc::new(RwLock::new(0)),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all accepted notifications, in publish order.
    pub async fn published(&self) -> Vec<PublishedNotification> {
        self.published.read().await.clone()
    }

    /// Lifecycle stages of accepted notifications, in publish order.
    pub async fn stages(&self) -> Vec<LifecycleStage> {
        self.published
            .read()
            .await
            .iter()
            .map(|p| p.event.stage)
            .collect()
    }

    /// Accepted events for one stage.
    pub async fn events_for_stage(&self, stage: LifecycleStage) -> Vec<NotificationEvent> {
        self.published
            .read()
            .await
            .iter()
            .filter(|p| p.event.stage == stage)
            .map(|p| p.event.clone())
            .collect()
    }

    pub async fn count_stage(&self, stage: LifecycleStage) -> usize {
        self.events_for_stage(stage).await.len()
    }

    /// Number of publish calls, accepted or not.
    pub async fn attempt_count(&self) -> usize {
        *self.attempts.read().await
    }

    /// Make every following publish fail.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Clear recorded notifications and attempts.
    pub async fn clear(&self) {
        self.published.write().await.clear();
        *self.attempts.write().await = 0;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn publish(&self, topic: &str, event: &NotificationEvent) -> Result<(), NotifyError> {
        *self.attempts.write().await += 1;

        if *self.fail.read().await {
            return Err(NotifyError::ConnectionFailed(
                "mock notifier set to fail".to_string(),
            ));
        }

        self.published.write().await.push(PublishedNotification {
            topic: topic.to_string(),
            event: event.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
