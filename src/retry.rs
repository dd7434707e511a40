//! Bounded retry logic with exponential backoff.
//!
//! Used by the roster cache around each fetch-and-rebuild attempt so a
//! transient provider failure (network error, 5xx, empty roster) does not
//! surface to callers until the attempt budget is spent.

use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{env_flag, env_var_parsed};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial try)
    pub max_attempts: u32,
    /// Base delay in milliseconds; doubles after every failed attempt
    pub base_delay_ms: u64,
    /// Cap for a single backoff delay
    pub max_delay_ms: u64,
    /// Maximum total elapsed time in milliseconds across all attempts
    pub max_elapsed_ms: u64,
    /// Randomize each delay in [0, delay) instead of sleeping the full delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            max_elapsed_ms: 30_000,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Load retry policy from environment variables with safe defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_var_parsed("RETRY_MAX_ATTEMPTS")
                .filter(|&n| n > 0 && n <= 10) // Safety: cap at 10
                .unwrap_or(defaults.max_attempts),
            base_delay_ms: env_var_parsed("RETRY_BASE_DELAY_MS").unwrap_or(defaults.base_delay_ms),
            max_delay_ms: env_var_parsed("RETRY_MAX_DELAY_MS")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_delay_ms),
            max_elapsed_ms: env_var_parsed("RETRY_MAX_ELAPSED_MS")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_elapsed_ms),
            jitter: env_flag("RETRY_JITTER").unwrap_or(defaults.jitter),
        }
    }

    /// Policy that tries once and never sleeps
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows failed `attempt` (1-based).
    ///
    /// Formula: min(max_delay, base_delay * 2^(attempt-1)), optionally jittered.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        if self.jitter {
            self.backoff_ms_with_jitter(attempt, |capped| {
                if capped == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..capped)
                }
            })
        } else {
            self.backoff_ms_with_jitter(attempt, |capped| capped)
        }
    }

    fn backoff_ms_with_jitter(&self, attempt: u32, jitter_fn: impl Fn(u64) -> u64) -> u64 {
        let exponent = attempt.saturating_sub(1);
        let multiplier = if exponent >= 32 {
            // Avoid overflow: 2^32 would overflow u64 once multiplied
            u64::MAX
        } else {
            1u64 << exponent
        };
        let exponential = self.base_delay_ms.saturating_mul(multiplier);
        jitter_fn(exponential.min(self.max_delay_ms))
    }
}

/// Retryable error information extracted from a failed attempt
#[derive(Debug)]
pub struct RetryableError {
    /// HTTP status code (if applicable)
    pub status_code: Option<u16>,
    /// Error message or reason
    pub message: String,
}

impl RetryableError {
    pub fn from_status(status: u16, message: String) -> Self {
        Self {
            status_code: Some(status),
            message,
        }
    }

    pub fn from_network(message: String) -> Self {
        Self {
            status_code: None,
            message,
        }
    }

    /// Create from anyhow::Error by inspecting the error chain
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{:#}", err);

        for cause in err.chain() {
            if let Some(reqwest_err) = cause.downcast_ref::<reqwest::Error>() {
                if let Some(status) = reqwest_err.status() {
                    return Self::from_status(status.as_u16(), message);
                }
            }
        }

        // Network, parse and empty-roster failures are all worth another try
        Self::from_network(message)
    }
}

/// Check if an error is retryable
///
/// NOT retryable: HTTP 4xx other than 408 (Request Timeout), 425 (Too Early)
/// and 429 (Too Many Requests). Everything else is.
pub fn is_retryable(err: &RetryableError) -> bool {
    match err.status_code {
        Some(status) => matches!(status, 408 | 425 | 429 | 500..=599),
        None => true,
    }
}

/// All attempts failed (or a non-retryable error cut the loop short)
#[derive(Debug)]
pub struct RetryExhausted {
    /// Attempts actually made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: anyhow::Error,
}

/// Retry an async operation with exponential backoff
///
/// # Arguments
/// * `policy` - Retry policy configuration
/// * `op_name` - Operation name for logging (e.g., "roster_refresh")
/// * `operation` - Async closure that returns Result<T>
pub async fn retry_async<T, Fut, F>(
    policy: &RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> std::result::Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        "retry op={} succeeded on attempt {} (elapsed={}ms)",
                        op_name,
                        attempt,
                        start.elapsed().as_millis()
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let classified = RetryableError::from_anyhow(&err);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let give_up = if !is_retryable(&classified) {
            Some("non-retryable")
        } else if attempt >= max_attempts {
            Some("attempts exhausted")
        } else if elapsed_ms >= policy.max_elapsed_ms {
            Some("elapsed budget spent")
        } else {
            None
        };

        if let Some(why) = give_up {
            warn!(
                "retry op={} giving up after {} attempt(s), {} (elapsed={}ms): {}",
                op_name, attempt, why, elapsed_ms, classified.message
            );
            return Err(RetryExhausted {
                attempts: attempt,
                last_error: err,
            });
        }

        // Never sleep past the elapsed budget
        let backoff_ms = policy
            .backoff_ms(attempt)
            .min(policy.max_elapsed_ms.saturating_sub(elapsed_ms));
        let reason = classified
            .status_code
            .map_or_else(|| "FETCH".to_string(), |status| format!("HTTP_{}", status));

        warn!(
            "retry op={} attempt={}/{} backoff_ms={} reason={}: {}",
            op_name, attempt, max_attempts, backoff_ms, reason, classified.message
        );

        if backoff_ms > 0 {
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
        attempt += 1;
    }
}
