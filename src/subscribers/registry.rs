//! # Subscription registry.
//!
//! Holds, per subscriber, an interest mask and an optional recurring timer.
//! Subscribers are stored as [`Weak`] references: the registry never extends a
//! subscriber's lifetime.
//!
//! ## Rules
//! - Owned by the hub loop; all methods take `&mut self` and are never called concurrently.
//! - Entries keep registration order; fan-out follows it.
//! - Re-subscribing ORs the new mask into the existing one (entry keeps its position).
//! - Dead entries are purged lazily: when a dispatch scan or a timer pass meets them.
//! - An entry with an empty mask never matches a published event; it only receives its
//!   own timer fires (the hub's retry monitor is registered this way).

use std::sync::{Arc, Weak};

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::events::EventType;
use crate::subscribers::subscribe::{SubscriberKey, Subscribe};
use crate::subscribers::timer::{TimerEntry, TimerSpec};

/// A live subscriber picked for delivery.
pub(crate) struct Target {
    pub key: SubscriberKey,
    pub name: &'static str,
    pub subscriber: Arc<dyn Subscribe>,
}

/// A live subscriber whose timer is due, with the bits to deliver.
pub(crate) struct TimerFire {
    pub target: Target,
    pub kind: EventType,
}

struct Subscription {
    key: SubscriberKey,
    name: &'static str,
    subscriber: Weak<dyn Subscribe>,
    interest: EventType,
    timer: Option<TimerEntry>,
}

impl Subscription {
    fn target(&self) -> Option<Target> {
        self.subscriber.upgrade().map(|subscriber| Target {
            key: self.key,
            name: self.name,
            subscriber,
        })
    }
}

/// Registry of subscriptions, in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Subscription>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or extends a subscription.
    ///
    /// `interest` must be non-empty and `timer` (if any) valid; the caller validates.
    /// A supplied timer replaces any existing one and is first due at `now + interval`.
    pub fn subscribe(
        &mut self,
        subscriber: Weak<dyn Subscribe>,
        name: &'static str,
        interest: EventType,
        timer: Option<TimerSpec>,
        now: Instant,
    ) -> SubscriberKey {
        let key = SubscriberKey::of_weak(&subscriber);
        let timer = timer.and_then(|spec| {
            let entry = TimerEntry::start(spec, now);
            if entry.is_none() {
                warn!(
                    subscriber = name,
                    interval = ?spec.interval,
                    "timer deadline out of range; timer not scheduled"
                );
            }
            entry
        });

        match self.entries.iter_mut().find(|s| s.key == key) {
            Some(existing) => {
                existing.interest |= interest;
                if timer.is_some() {
                    existing.timer = timer;
                }
                debug!(subscriber = name, interest = %existing.interest, "subscription extended");
            }
            None => {
                self.entries.push(Subscription {
                    key,
                    name,
                    subscriber,
                    interest,
                    timer,
                });
                debug!(subscriber = name, %interest, "subscription added");
            }
        }
        key
    }

    /// Removes bits (or the whole subscription if `mask` is `None`).
    ///
    /// A subscription whose mask drops to zero is removed. Clearing the last bits that
    /// overlap the timer's event type cancels the timer.
    ///
    /// Returns `true` if the subscriber was registered.
    pub fn unsubscribe(&mut self, key: SubscriberKey, mask: Option<EventType>) -> bool {
        let Some(pos) = self.entries.iter().position(|s| s.key == key) else {
            return false;
        };

        let Some(mask) = mask else {
            let removed = self.entries.remove(pos);
            debug!(subscriber = removed.name, "subscription removed");
            return true;
        };

        let entry = &mut self.entries[pos];
        entry.interest = entry.interest.without(mask);

        if entry.interest.is_empty() {
            let removed = self.entries.remove(pos);
            debug!(subscriber = removed.name, "subscription removed (mask emptied)");
            return true;
        }

        if let Some(timer) = &entry.timer {
            let timer_bits = timer.spec.event_type;
            if mask.intersects(timer_bits) && !entry.interest.intersects(timer_bits) {
                entry.timer = None;
                debug!(subscriber = entry.name, "timer cancelled");
            }
        }
        true
    }

    /// Collects live subscribers interested in `kind`, pruning dead entries on the way.
    pub fn matching(&mut self, kind: EventType) -> Vec<Target> {
        let mut targets = Vec::new();
        self.entries.retain(|s| match s.target() {
            Some(target) => {
                if s.interest.intersects(kind) {
                    targets.push(target);
                }
                true
            }
            None => {
                debug!(subscriber = s.name, "pruned dead subscriber during dispatch");
                false
            }
        });
        targets
    }

    /// Earliest timer deadline, if any timer is registered.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .iter()
            .filter_map(|s| s.timer.as_ref().map(|t| t.next_fire_at))
            .min()
    }

    /// Collects due timers and advances their deadlines past `now`.
    ///
    /// A dead subscriber with a due timer is removed instead of fired.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerFire> {
        let mut fires = Vec::new();
        self.entries.retain_mut(|s| {
            let Some(timer) = s.timer.as_mut() else {
                return true;
            };
            if !timer.is_due(now) {
                return true;
            }
            let Some(target) = s.subscriber.upgrade().map(|subscriber| Target {
                key: s.key,
                name: s.name,
                subscriber,
            }) else {
                debug!(subscriber = s.name, "pruned dead subscriber with due timer");
                return false;
            };

            fires.push(TimerFire {
                target,
                kind: timer.spec.event_type | EventType::TIMER,
            });
            match timer.advance_past(now) {
                Some(0) => {}
                Some(skipped) => {
                    debug!(subscriber = s.name, skipped, "timer collapsed missed intervals");
                }
                None => {
                    warn!(subscriber = s.name, "next timer deadline out of range; timer stopped");
                    s.timer = None;
                }
            }
            true
        });
        fires
    }

    /// Current interest mask of `key`.
    #[cfg(test)]
    pub fn interest(&self, key: SubscriberKey) -> Option<EventType> {
        self.entries.iter().find(|s| s.key == key).map(|s| s.interest)
    }

    /// Returns `true` if `key` has a timer scheduled.
    #[cfg(test)]
    pub fn has_timer(&self, key: SubscriberKey) -> bool {
        self.entries
            .iter()
            .any(|s| s.key == key && s.timer.is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn timer_count(&self) -> usize {
        self.entries.iter().filter(|s| s.timer.is_some()).count()
    }
}
