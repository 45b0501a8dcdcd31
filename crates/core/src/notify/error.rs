use thiserror::Error;

/// Errors raised while publishing a lifecycle notification.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Publish failed: {0}")]
    Other(String),
}
