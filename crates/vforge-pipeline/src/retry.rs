//! Bounded polling for upstream async tasks.
//!
//! One generic fixed-interval loop with an attempt ceiling, reused by
//! generation polling wherever the pipeline waits on an external task.
//! Exceeding the ceiling surfaces as exhaustion rather than hanging.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Configuration for a bounded polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of polls before giving up.
    pub max_attempts: u32,
    /// Fixed delay between polls.
    pub interval: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl PollConfig {
    pub fn new(operation_name: impl Into<String>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            operation_name: operation_name.into(),
        }
    }
}

/// Outcome of a bounded polling loop.
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// The polled operation reached a terminal state.
    Ready(T),
    /// The attempt ceiling was reached without a terminal state.
    Exhausted { attempts: u32 },
}

/// Poll `operation` until it yields a value or the ceiling is reached.
///
/// `operation` returns `Ok(Some(value))` when terminal, `Ok(None)` to keep
/// polling, or `Err` to abort immediately.
pub async fn poll_until<F, Fut, T, E>(
    config: &PollConfig,
    operation: F,
) -> Result<PollOutcome<T>, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for attempt in 1..=config.max_attempts {
        if let Some(value) = operation().await? {
            debug!(
                "{} terminal after {} poll(s)",
                config.operation_name, attempt
            );
            return Ok(PollOutcome::Ready(value));
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    debug!(
        "{} exhausted {} polls",
        config.operation_name, config.max_attempts
    );
    Ok(PollOutcome::Exhausted {
        attempts: config.max_attempts,
    })
}

/// Linear backoff delay for retry attempt `attempt` (1-based).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}
