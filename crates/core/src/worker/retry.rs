//! Exponential backoff for invocation-layer failures.

use std::time::Duration;

use crate::config::RetryConfig;

/// Bounded exponential backoff: `initial_delay * multiplier^(attempt - 1)`,
/// clamped to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Total attempts including the first call.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.backoff_multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based),
    /// or `None` once no attempts remain.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }

    /// Every delay the policy can produce, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
                Duration::from_secs(32),
            ]
        );
    }

    #[test]
    fn test_no_delay_after_last_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(5), Some(Duration::from_secs(32)));
        assert_eq!(policy.delay_after(6), None);
        assert_eq!(policy.delay_after(0), None);
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::from(&RetryConfig {
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 1_000,
            max_attempts: 1,
        });
        assert!(policy.schedule().is_empty());
    }

    #[test]
    fn test_constant_backoff() {
        let policy = RetryPolicy::from(&RetryConfig {
            initial_delay_ms: 250,
            backoff_multiplier: 1.0,
            max_delay_ms: 1_000,
            max_attempts: 4,
        });
        assert_eq!(policy.schedule(), vec![Duration::from_millis(250); 3]);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::from(&RetryConfig {
            initial_delay_ms: 1_000,
            backoff_multiplier: 10.0,
            max_delay_ms: 30_000,
            max_attempts: 5,
        });
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(10),
                Duration::from_secs(30),
                Duration::from_secs(30),
            ]
        );
    }

    #[test]
    fn test_overflowing_delay_clamps_to_cap() {
        let huge_multiplier = RetryPolicy::from(&RetryConfig {
            backoff_multiplier: 1e20,
            ..RetryConfig::default()
        });
        assert_eq!(huge_multiplier.delay_after(2), Some(huge_multiplier.max_delay));

        let many_attempts = RetryPolicy::from(&RetryConfig {
            max_attempts: 100,
            ..RetryConfig::default()
        });
        let schedule = many_attempts.schedule();
        assert_eq!(schedule.len(), 99);
        assert_eq!(schedule[98], Duration::from_millis(300_000));
    }
}
