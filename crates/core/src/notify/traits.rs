use async_trait::async_trait;

use crate::transfer::NotificationEvent;

use super::NotifyError;

/// A publish/subscribe channel lifecycle events are sent to.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish one event to `topic`. Implementations must not retry.
    async fn publish(&self, topic: &str, event: &NotificationEvent) -> Result<(), NotifyError>;

    /// Name of this notification backend
    fn name(&self) -> &'static str;
}
