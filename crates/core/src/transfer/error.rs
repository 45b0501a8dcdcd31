//! Error types for transfer request validation.

use thiserror::Error;

/// Reasons a transfer request is rejected before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A mandatory field is empty.
    #[error("Parameter '{0}' must be specified")]
    MissingField(&'static str),

    /// The id is not a single path segment.
    #[error("Invalid id '{0}': must be a single path segment")]
    InvalidId(String),

    /// The source URL could not be parsed.
    #[error("Invalid source URL '{url}': {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    /// The source URL uses a scheme the worker cannot fetch from.
    #[error("Unsupported source URL scheme: {0}")]
    UnsupportedScheme(String),
}
