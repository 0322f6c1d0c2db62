//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging event handlers into the hub.
//! Handlers are invoked **synchronously** on the hub loop, one at a time, in
//! registration order.
//!
//! ## Contract
//! - Return quickly. The hub enforces no timeout; a blocking handler stalls every
//!   subscriber and every timer.
//! - Errors and panics are caught at the dispatcher boundary and logged; they never
//!   reach the publisher and never stop delivery to the remaining subscribers.
//! - The hub stores only a [`Weak`] reference. Dropping the last `Arc` silently
//!   cancels the subscription; the entry is purged on the next dispatch or timer pass.
//! - A handler may call back into a [`HubHandle`](crate::HubHandle) (publish,
//!   subscribe, queue, acknowledge). Those calls are queued behind the current dispatch.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventvisor::{Event, HandlerError, Subscribe};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl Subscribe for Counter {
//!     fn on_event(&self, _ev: &Event) -> Result<(), HandlerError> {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "counter" }
//! }
//! ```

use std::sync::{Arc, Weak};

use crate::error::HandlerError;
use crate::events::Event;

/// Contract for event subscribers.
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    ///
    /// Called on the hub loop. Timer events arrive with [`EventType::TIMER`](crate::EventType::TIMER)
    /// set on `event.kind`.
    fn on_event(&self, event: &Event) -> Result<(), HandlerError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Identity of a subscriber allocation.
///
/// Two `Arc`s pointing at the same object share a key. The hub keeps a `Weak` to the
/// allocation for as long as the key is registered, so the address cannot be reused
/// by another subscriber in the meantime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberKey(usize);

impl SubscriberKey {
    /// Key of the object behind `sub`.
    pub fn of<S: Subscribe>(sub: &Arc<S>) -> Self {
        Self(Arc::as_ptr(sub).cast::<()>() as usize)
    }

    pub(crate) fn of_weak(sub: &Weak<dyn Subscribe>) -> Self {
        Self(sub.as_ptr().cast::<()>() as usize)
    }
}

impl<S: Subscribe> From<&Arc<S>> for SubscriberKey {
    fn from(sub: &Arc<S>) -> Self {
        SubscriberKey::of(sub)
    }
}

/// Returned by [`HubHandle::subscribe`](crate::HubHandle::subscribe).
///
/// Pass it to [`HubHandle::unsubscribe`](crate::HubHandle::unsubscribe) to cancel.
///
/// The handle holds a [`Weak`] to the subscriber: it never keeps the subscriber alive,
/// but it does keep its allocation reserved. A stale handle therefore can never match a
/// newer subscriber that happens to be allocated at a recycled address.
#[derive(Clone, Debug)]
pub struct SubscriptionHandle {
    key: SubscriberKey,
    name: &'static str,
    subscriber: Weak<dyn Subscribe>,
}

impl SubscriptionHandle {
    pub(crate) fn new(subscriber: Weak<dyn Subscribe>, name: &'static str) -> Self {
        Self {
            key: SubscriberKey::of_weak(&subscriber),
            name,
            subscriber,
        }
    }

    /// Subscriber identity.
    pub fn key(&self) -> SubscriberKey {
        self.key
    }

    /// Subscriber name, as reported by [`Subscribe::name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` while the subscriber object is still alive.
    pub fn is_alive(&self) -> bool {
        self.subscriber.strong_count() > 0
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SubscriptionHandle {}

impl From<&SubscriptionHandle> for SubscriberKey {
    fn from(handle: &SubscriptionHandle) -> Self {
        handle.key
    }
}

impl From<SubscriptionHandle> for SubscriberKey {
    fn from(handle: SubscriptionHandle) -> Self {
        handle.key
    }
}
