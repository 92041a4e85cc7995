//! What the startup revalidation does when "get current user" fails.
//!
//! [`RevalidationPolicy::FailClosed`] treats every failure as an invalid
//! session. [`RevalidationPolicy::RetryTransient`] separates the backend
//! rejecting the token (log out at once) from the backend being
//! unreachable or broken (retry with exponential backoff, then log out).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use haven_client::{ApiError, ConfigError};

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RevalidationPolicy {
    #[default]
    FailClosed,
    RetryTransient(BackoffConfig),
}

/// Policy names as accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationMode {
    FailClosed,
    RetryTransient,
}

impl RevalidationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RevalidationMode::FailClosed => "fail-closed",
            RevalidationMode::RetryTransient => "retry-transient",
        }
    }
}

impl fmt::Display for RevalidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevalidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fail-closed" => Ok(RevalidationMode::FailClosed),
            "retry-transient" => Ok(RevalidationMode::RetryTransient),
            other => Err(ConfigError {
                var: "HAVEN_REVALIDATION",
                expected: "'fail-closed' or 'retry-transient'",
                value: other.to_string(),
            }),
        }
    }
}

impl RevalidationPolicy {
    pub fn from_mode(mode: RevalidationMode, max_attempts: u32) -> Self {
        match mode {
            RevalidationMode::FailClosed => RevalidationPolicy::FailClosed,
            RevalidationMode::RetryTransient => RevalidationPolicy::RetryTransient(BackoffConfig {
                max_attempts: max_attempts.max(1),
                ..Default::default()
            }),
        }
    }

    /// Load the policy from environment variables with defaults.
    ///
    /// | Env Var                           | Default       |
    /// |-----------------------------------|---------------|
    /// | `HAVEN_REVALIDATION`              | `fail-closed` |
    /// | `HAVEN_REVALIDATION_MAX_ATTEMPTS` | `3`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode: RevalidationMode = std::env::var("HAVEN_REVALIDATION")
            .unwrap_or_else(|_| RevalidationMode::FailClosed.as_str().into())
            .parse()?;

        let raw_attempts = std::env::var("HAVEN_REVALIDATION_MAX_ATTEMPTS")
            .unwrap_or_else(|_| BackoffConfig::default().max_attempts.to_string());
        let max_attempts: u32 = raw_attempts.trim().parse().map_err(|_| ConfigError {
            var: "HAVEN_REVALIDATION_MAX_ATTEMPTS",
            expected: "a positive whole number",
            value: raw_attempts.clone(),
        })?;

        Ok(Self::from_mode(mode, max_attempts))
    }

    /// Whether to try again after `attempt` (1-based) failed with `error`.
    /// Returns the delay to wait first.
    pub fn retry_after(&self, error: &ApiError, attempt: u32, delay: Duration) -> Option<Duration> {
        match self {
            RevalidationPolicy::FailClosed => None,
            RevalidationPolicy::RetryTransient(config) => {
                (error.is_transient() && attempt < config.max_attempts).then_some(delay)
            }
        }
    }

    /// Delay before the second attempt.
    pub fn initial_delay(&self) -> Duration {
        match self {
            RevalidationPolicy::FailClosed => Duration::ZERO,
            RevalidationPolicy::RetryTransient(config) => config.initial_delay,
        }
    }

    pub fn next_delay(&self, current: Duration) -> Duration {
        match self {
            RevalidationPolicy::FailClosed => current,
            RevalidationPolicy::RetryTransient(config) => next_delay(current, config),
        }
    }
}
