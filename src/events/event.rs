//! # Events delivered to subscribers.
//!
//! An [`Event`] pairs an [`EventType`] with a free-form JSON [`Payload`].
//! The hub never inspects the payload; its meaning belongs to whoever defined the bits.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Within one hub, events are dispatched in mailbox order, so `seq` also reflects
//! dispatch order for events published through the same handle.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Event, EventType};
//! use serde_json::json;
//!
//! let ev = Event::new(EventType::new(0b0010))
//!     .with_field("phase", json!("review"))
//!     .with_field("step", json!(3));
//!
//! assert_eq!(ev.kind, EventType::new(0b0010));
//! assert_eq!(ev.payload.get("phase"), Some(&json!("review")));
//! assert!(!ev.is_timer());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use serde_json::Value;

use super::kind::EventType;

/// Free-form event payload.
pub type Payload = serde_json::Map<String, Value>;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Published event with metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `payload`: shared, cheap to clone across subscribers
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification bits.
    pub kind: EventType,
    /// Opaque payload.
    pub payload: Arc<Payload>,
}

impl Event {
    /// Creates an event with an empty payload, current timestamp and next sequence number.
    pub fn new(kind: EventType) -> Self {
        Self::with_payload(kind, Payload::new())
    }

    /// Creates an event carrying `payload`.
    pub fn with_payload(kind: EventType, payload: Payload) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            payload: Arc::new(payload),
        }
    }

    /// Creates a timer event for a subscription whose timer carries `kind`.
    ///
    /// The timer bit is always set on the result.
    #[inline]
    pub fn timer(kind: EventType) -> Self {
        Self::new(kind | EventType::TIMER)
    }

    /// Inserts a payload field.
    #[inline]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        Arc::make_mut(&mut self.payload).insert(key.into(), value);
        self
    }

    /// Returns `true` if this event was generated by a timer.
    #[inline]
    pub fn is_timer(&self) -> bool {
        self.kind.is_timer()
    }
}
