//! HTTP webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::transfer::{LifecycleStage, NotificationEvent, NotificationKind};

use super::{Notifier, NotifyError};

/// JSON body POSTed for every event.
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    topic: &'a str,
    kind: NotificationKind,
    stage: LifecycleStage,
    request_id: &'a str,
    message: &'a str,
    payload: &'a Value,
    timestamp: DateTime<Utc>,
}

/// Publishes events by POSTing them to a subscriber endpoint.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, topic: &str, event: &NotificationEvent) -> Result<(), NotifyError> {
        let message = WebhookMessage {
            topic,
            kind: event.kind,
            stage: event.stage,
            request_id: &event.request_id,
            message: &event.message,
            payload: &event.payload,
            timestamp: event.timestamp,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else if e.is_connect() {
                    NotifyError::ConnectionFailed(e.to_string())
                } else {
                    NotifyError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        debug!(topic, stage = event.stage.as_str(), "Webhook notification delivered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
