//! # Hub configuration.
//!
//! Provides [`HubConfig`] centralized settings for the hub loop and its retry monitor.
//!
//! ## Sentinel values
//! - `retry_tick = 0s` → clamped to 1ms (a timer must have a positive interval)
//! - `retry_tick > MAX_INTERVAL` → clamped to [`MAX_INTERVAL`]
//! - `ack_timeout = 0s` → every tracked instruction is overdue at each sweep

use std::time::Duration;

use crate::subscribers::MAX_INTERVAL;

/// Minimum usable retry tick.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Configuration for a [`Hub`](crate::Hub).
///
/// ## Field semantics
/// - `retry_tick`: how often the retry monitor wakes up
/// - `ack_timeout`: how long an instruction may stay unacknowledged before a retry
/// - `default_max_retries`: ceiling used by [`HubHandle::queue_instruction_default`](crate::HubHandle::queue_instruction_default)
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Interval of the retry monitor's timer.
    pub retry_tick: Duration,

    /// Minimum time since the last send before an instruction is retried.
    pub ack_timeout: Duration,

    /// Retry ceiling for instructions queued without an explicit one.
    pub default_max_retries: u32,
}

impl HubConfig {
    /// Returns the retry tick clamped to `[1ms, MAX_INTERVAL]`.
    #[inline]
    pub fn retry_tick_clamped(&self) -> Duration {
        self.retry_tick.clamp(MIN_TICK, MAX_INTERVAL)
    }
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `retry_tick = 60s`
    /// - `ack_timeout = 30s`
    /// - `default_max_retries = 3`
    fn default() -> Self {
        Self {
            retry_tick: Duration::from_secs(60),
            ack_timeout: Duration::from_secs(30),
            default_max_retries: 3,
        }
    }
}
