use reqwest::Url;

use super::{
    types::{Config, NotifierBackend},
    ConfigError,
};

/// Upper bound on segment fetchers a single worker invocation may run
pub const MAX_THREAD_COUNT: u32 = 20;

/// Validate configuration
/// Currently validates:
/// - Worker endpoint is an http(s) URL
/// - Thread count is within 1..=MAX_THREAD_COUNT
/// - Retry policy allows at least one attempt, never shrinks delays, and
///   caps delays no lower than the initial delay
/// - Webhook backend has a webhook URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_http_url("worker.endpoint", &config.worker.endpoint)?;

    if config.worker.thread_count == 0 || config.worker.thread_count > MAX_THREAD_COUNT {
        return Err(ConfigError::ValidationError(format!(
            "worker.thread_count must be between 1 and {}",
            MAX_THREAD_COUNT
        )));
    }

    if config.worker.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "worker.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if !config.retry.backoff_multiplier.is_finite() || config.retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "retry.backoff_multiplier must be at least 1.0".to_string(),
        ));
    }

    if config.retry.max_delay_ms < config.retry.initial_delay_ms {
        return Err(ConfigError::ValidationError(
            "retry.max_delay_ms cannot be below retry.initial_delay_ms".to_string(),
        ));
    }

    if config.notifications.backend == NotifierBackend::Webhook {
        match config.notifications.webhook_url.as_deref() {
            Some(url) if !url.is_empty() => validate_http_url("notifications.webhook_url", url)?,
            _ => {
                return Err(ConfigError::ValidationError(
                    "notifications.webhook_url must be set when backend = \"webhook\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid URL: {}", field, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[worker]
endpoint = "http://localhost:9000/invoke"

[storage]
root = "/srv/vod"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_bad_endpoint_fails() {
        let mut config = base_config();
        config.worker.endpoint = "localhost:9000".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        config.worker.endpoint = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_thread_count_bounds() {
        let mut config = base_config();
        config.worker.thread_count = 0;
        assert!(validate_config(&config).is_err());

        config.worker.thread_count = MAX_THREAD_COUNT + 1;
        assert!(validate_config(&config).is_err());

        config.worker.thread_count = MAX_THREAD_COUNT;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_retry_policy() {
        let mut config = base_config();
        config.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());

        let mut config = base_config();
        config.retry.backoff_multiplier = 0.5;
        assert!(validate_config(&config).is_err());

        let mut config = base_config();
        config.retry.max_delay_ms = config.retry.initial_delay_ms - 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_valid_retry_extremes_produce_bounded_delays() {
        let mut config = base_config();
        config.retry.backoff_multiplier = 1e20;
        config.retry.max_attempts = 100;
        assert!(validate_config(&config).is_ok());

        let policy = crate::RetryPolicy::from(&config.retry);
        let cap = std::time::Duration::from_millis(config.retry.max_delay_ms);
        assert!(policy.schedule().iter().all(|delay| *delay <= cap));
        assert_eq!(policy.delay_after(2), Some(cap));
    }

    #[test]
    fn test_validate_webhook_requires_url() {
        let mut config = base_config();
        config.notifications.backend = NotifierBackend::Webhook;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("webhook_url"));

        config.notifications.webhook_url = Some("https://hooks.example.com/vod".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
