use async_trait::async_trait;
use tracing::{error, info};

use crate::transfer::{NotificationEvent, NotificationKind};

use super::{Notifier, NotifyError};

/// Notifier that only writes events to the log.
/// Used when no external channel is configured.
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, topic: &str, event: &NotificationEvent) -> Result<(), NotifyError> {
        match event.kind {
            NotificationKind::Info => info!(
                topic,
                request_id = %event.request_id,
                stage = event.stage.as_str(),
                payload = %event.payload,
                "{}",
                event.message
            ),
            NotificationKind::Error => error!(
                topic,
                request_id = %event.request_id,
                stage = event.stage.as_str(),
                payload = %event.payload,
                "{}",
                event.message
            ),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
