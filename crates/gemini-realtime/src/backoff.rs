//! Reconnection backoff policy.

use std::time::Duration;

/// Exponential backoff with a cap, bounded by a maximum attempt count.
///
/// The delay is a pure function of the attempt number; the runtime
/// sleeps via `tokio::time`, so tests run against virtual time instead
/// of real sleeping.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Delay before reconnect attempt `attempt` (1-based): doubles each
    /// attempt and saturates at `cap`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let multiplier = 1u128 << exp;
        let ms = self
            .base
            .as_millis()
            .saturating_mul(multiplier)
            .min(self.cap.as_millis());
        Duration::from_millis(ms as u64)
    }
}
