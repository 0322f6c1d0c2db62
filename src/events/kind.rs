//! # Event type bitmask.
//!
//! [`EventType`] is an opaque `u64` bitmask. Callers own every bit except
//! [`EventType::TIMER`], which the hub sets on events generated by recurring timers.
//!
//! ## Rules
//! - Types are combined with `|` and matched with `&` (see [`EventType::intersects`]).
//! - The hub never routes on bit meaning; the timer bit is bookkeeping only.
//!
//! ## Example
//! ```rust
//! use eventvisor::EventType;
//!
//! const PHASE_CHANGED: EventType = EventType::new(0b0010);
//! const CONTENT_SAVED: EventType = EventType::new(0b0100);
//!
//! let interest = PHASE_CHANGED | CONTENT_SAVED;
//! assert!(interest.intersects(PHASE_CHANGED));
//! assert!(!interest.intersects(EventType::new(0b1000)));
//! assert_eq!(interest.without(CONTENT_SAVED), PHASE_CHANGED);
//! ```

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Opaque event classification bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(u64);

impl EventType {
    /// No bits set. Never a valid interest mask.
    pub const EMPTY: EventType = EventType(0);

    /// Reserved bit marking scheduler-generated (timer) events.
    pub const TIMER: EventType = EventType(1 << 63);

    /// Wraps raw bits.
    #[inline]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns raw bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if `self & other != 0`.
    #[inline]
    pub const fn intersects(self, other: EventType) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: EventType) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `self` with the bits of `other` cleared.
    #[inline]
    pub const fn without(self, other: EventType) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns `true` if the timer bit is set.
    #[inline]
    pub const fn is_timer(self) -> bool {
        self.intersects(Self::TIMER)
    }
}

impl From<u64> for EventType {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl BitOr for EventType {
    type Output = EventType;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventType {
    type Output = EventType;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for EventType {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for EventType {
    type Output = EventType;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({:#x})", self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Binary for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}
