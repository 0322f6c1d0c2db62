//! # Recurring timers attached to subscriptions.
//!
//! A [`TimerSpec`] asks the hub to deliver `event_type | TIMER` to one subscriber
//! every `interval`. Timer events are addressed to their owner only; they are
//! never broadcast to other subscribers.
//!
//! ## Late wake-ups
//! If the loop wakes after several intervals elapsed, the timer fires **once** and
//! its deadline is advanced by whole intervals until it lies strictly after `now`:
//! ```text
//! interval = 1s, registered at t0, loop wakes at t0 + 3.4s
//!   fire once; next = t0 + 4s   (t0 + 2s, t0 + 3s are skipped, not replayed)
//! ```
//! The skip is computed in one step, however small the interval and however late the wake.
//!
//! ## Limits
//! Intervals must lie in `(0, MAX_INTERVAL]`. A deadline that cannot be represented as an
//! [`Instant`] stops the timer instead of panicking the loop.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::HubError;
use crate::events::EventType;

/// Longest accepted timer interval (100 years).
pub const MAX_INTERVAL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Recurring timer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerSpec {
    /// Period between fires. Must be non-zero and at most [`MAX_INTERVAL`].
    pub interval: Duration,
    /// Bits delivered with each fire (the timer bit is added by the hub).
    pub event_type: EventType,
}

impl TimerSpec {
    /// Creates a timer spec.
    pub fn new(interval: Duration, event_type: EventType) -> Self {
        Self {
            interval,
            event_type,
        }
    }

    /// Creates a timer spec from fractional seconds.
    ///
    /// Rejects negative, zero, NaN, infinite and oversized intervals.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use eventvisor::{EventType, TimerSpec};
    ///
    /// let spec = TimerSpec::from_secs_f64(1.5, EventType::new(0b10)).unwrap();
    /// assert_eq!(spec.interval, Duration::from_millis(1500));
    /// assert!(TimerSpec::from_secs_f64(-1.0, EventType::new(0b10)).is_err());
    /// assert!(TimerSpec::from_secs_f64(1e19, EventType::new(0b10)).is_err());
    /// ```
    pub fn from_secs_f64(secs: f64, event_type: EventType) -> Result<Self, HubError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(HubError::invalid(format!(
                "timer interval must be a positive number of seconds, got {secs}"
            )));
        }
        let interval = Duration::try_from_secs_f64(secs)
            .map_err(|e| HubError::invalid(format!("timer interval out of range: {e}")))?;
        let spec = Self::new(interval, event_type);
        spec.validate()?;
        Ok(spec)
    }

    /// Checks that the interval is usable.
    pub(crate) fn validate(&self) -> Result<(), HubError> {
        if self.interval.is_zero() {
            return Err(HubError::invalid("timer interval must be non-zero"));
        }
        if self.interval > MAX_INTERVAL || Instant::now().checked_add(self.interval).is_none() {
            return Err(HubError::invalid(format!(
                "timer interval {:?} exceeds the maximum of {MAX_INTERVAL:?}",
                self.interval
            )));
        }
        Ok(())
    }
}

/// Scheduled state of one subscription's timer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TimerEntry {
    pub spec: TimerSpec,
    pub next_fire_at: Instant,
}

impl TimerEntry {
    /// First deadline is one interval after `now`.
    ///
    /// Returns `None` if that deadline is not representable.
    pub fn start(spec: TimerSpec, now: Instant) -> Option<Self> {
        Some(Self {
            spec,
            next_fire_at: now.checked_add(spec.interval)?,
        })
    }

    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_fire_at <= now
    }

    /// Moves the deadline past `now` by whole intervals.
    ///
    /// Returns the number of intervals skipped beyond the one being fired, or `None` if
    /// the next deadline is not representable (the timer must then be dropped).
    pub fn advance_past(&mut self, now: Instant) -> Option<u64> {
        let step = self.spec.interval.as_nanos();
        let late = now.saturating_duration_since(self.next_fire_at).as_nanos();
        let steps = late.checked_div(step)? + 1;
        let offset = u64::try_from(steps.checked_mul(step)?).ok()?;

        self.next_fire_at = self.next_fire_at.checked_add(Duration::from_nanos(offset))?;
        u64::try_from(steps - 1).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(ms: u64) -> TimerSpec {
        TimerSpec::new(Duration::from_millis(ms), EventType::new(0b10))
    }

    #[test]
    fn test_first_deadline_is_one_interval_out() {
        let now = Instant::now();
        let entry = TimerEntry::start(spec(1000), now).unwrap();
        assert_eq!(entry.next_fire_at, now + Duration::from_secs(1));
        assert!(!entry.is_due(now));
        assert!(entry.is_due(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_on_time_fire_advances_one_interval() {
        let t0 = Instant::now();
        let mut entry = TimerEntry::start(spec(1000), t0).unwrap();
        let skipped = entry.advance_past(t0 + Duration::from_secs(1));

        assert_eq!(skipped, Some(0));
        assert_eq!(entry.next_fire_at, t0 + Duration::from_secs(2));
    }

    #[test]
    fn test_late_wake_collapses_missed_intervals() {
        let t0 = Instant::now();
        let mut entry = TimerEntry::start(spec(1000), t0).unwrap();
        let now = t0 + Duration::from_millis(3400);
        let skipped = entry.advance_past(now);

        assert_eq!(skipped, Some(2));
        assert_eq!(entry.next_fire_at, t0 + Duration::from_secs(4));
        assert!(entry.next_fire_at > now);
    }

    #[test]
    fn test_wake_exactly_on_boundary_moves_strictly_past_now() {
        let t0 = Instant::now();
        let mut entry = TimerEntry::start(spec(1000), t0).unwrap();
        let now = t0 + Duration::from_secs(3);
        entry.advance_past(now);
        assert_eq!(entry.next_fire_at, t0 + Duration::from_secs(4));
    }

    #[test]
    fn test_from_secs_rejects_bad_values() {
        let et = EventType::new(1);
        assert!(TimerSpec::from_secs_f64(0.0, et).is_err());
        assert!(TimerSpec::from_secs_f64(-0.5, et).is_err());
        assert!(TimerSpec::from_secs_f64(f64::NAN, et).is_err());
        assert!(TimerSpec::from_secs_f64(f64::INFINITY, et).is_err());
        assert!(TimerSpec::from_secs_f64(0.25, et).is_ok());
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        assert!(spec(0).validate().is_err());
        assert!(spec(1).validate().is_ok());
    }

    #[test]
    fn test_tiny_interval_long_lateness_advances_in_one_step() {
        let t0 = Instant::now();
        let tiny = TimerSpec::new(Duration::from_nanos(1), EventType::new(0b10));
        let mut entry = TimerEntry::start(tiny, t0).unwrap();
        let now = t0 + Duration::from_secs(3600);

        let skipped = entry.advance_past(now);
        assert_eq!(skipped, Some(3_600_000_000_000 - 1));
        assert_eq!(entry.next_fire_at, now + Duration::from_nanos(1));
    }

    #[test]
    fn test_oversized_intervals_are_rejected() {
        let et = EventType::new(1);
        assert!(TimerSpec::from_secs_f64(1e19, et).is_err());
        assert!(TimerSpec::new(Duration::MAX, et).validate().is_err());
        assert!(TimerSpec::new(MAX_INTERVAL + Duration::from_secs(1), et).validate().is_err());
        assert!(TimerSpec::new(MAX_INTERVAL, et).validate().is_ok());
    }

    #[test]
    fn test_unrepresentable_deadline_is_reported() {
        let now = Instant::now();
        let huge = TimerSpec::new(Duration::MAX, EventType::new(1));
        assert!(TimerEntry::start(huge, now).is_none());
    }
}
