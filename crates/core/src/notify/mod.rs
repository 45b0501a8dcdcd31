//! Lifecycle notifications.
//!
//! The orchestrator publishes at five points: precondition failure, start,
//! every resumption, success, and final failure. Backends implement
//! [`Notifier`]; the [`NotificationGateway`] binds one to a topic and decides
//! whether a failed publish stops the run.

mod error;
mod gateway;
mod log_notifier;
mod traits;
mod webhook;

pub use error::NotifyError;
pub use gateway::NotificationGateway;
pub use log_notifier::LogNotifier;
pub use traits::Notifier;
pub use webhook::WebhookNotifier;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{NotificationConfig, NotifierBackend};

/// Factory function to create a notifier from config
pub fn create_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.backend {
        NotifierBackend::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierBackend::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    NotifyError::ConfigurationError(
                        "webhook_url must be set when using the webhook backend".to_string(),
                    )
                })?;
            Ok(Arc::new(WebhookNotifier::new(
                url,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
    }
}

/// Build the gateway the orchestrator publishes through.
pub fn create_gateway(config: &NotificationConfig) -> Result<NotificationGateway, NotifyError> {
    let notifier = create_notifier(config)?;
    Ok(NotificationGateway::new(
        notifier,
        config.topic.clone(),
        config.publish_failure,
    ))
}
