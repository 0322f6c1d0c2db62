//! # Hub handle: the public entry point.
//!
//! [`HubHandle`] is a cheap, cloneable front for the hub loop. Every operation is turned
//! into a [`Command`] and pushed onto the loop's single-consumer mailbox, so all registry
//! and tracker state stays owned by one task and no locks are needed.
//!
//! ## Rules
//! - Mutating operations (`subscribe`, `unsubscribe`, `publish`, `queue_instruction`,
//!   `acknowledge`) are synchronous and never wait on the loop. They validate arguments
//!   immediately and are safe to call from inside a subscriber's handler.
//! - Commands are applied in the order they were sent.
//! - Query operations (`next_delivery`, `snapshot`) are async request/reply; do not await
//!   them from code running on the hub loop.
//! - After the loop stops every operation returns [`HubError::Closed`].

use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::HubError;
use crate::events::{Event, EventType, Payload};
use crate::instructions::{Delivery, InstructionId, PendingSnapshot, SweepReport};
use crate::subscribers::{Subscribe, SubscriberKey, SubscriptionHandle, TimerSpec};

/// Mailbox message consumed by the hub loop.
pub(crate) enum Command {
    Subscribe {
        subscriber: Weak<dyn Subscribe>,
        name: &'static str,
        interest: EventType,
        timer: Option<TimerSpec>,
    },
    Unsubscribe {
        key: SubscriberKey,
        mask: Option<EventType>,
    },
    Publish(Event),
    Queue {
        content: String,
        max_retries: u32,
        priority: bool,
    },
    Acknowledge(InstructionId),
    RetrySweep,
    NextDelivery(oneshot::Sender<Option<Delivery>>),
    Snapshot(oneshot::Sender<HubSnapshot>),
}

/// Point-in-time view of hub state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HubSnapshot {
    /// Registered subscriptions (dead ones not yet purged included).
    pub subscriptions: usize,
    /// Subscriptions with a recurring timer, the retry monitor's included.
    pub timers: usize,
    /// Deliveries waiting to be taken.
    pub queued: usize,
    /// Unacknowledged instructions, oldest first.
    pub pending: Vec<PendingSnapshot>,
    /// Outcome of the most recent retry sweep.
    pub last_sweep: Option<SweepReport>,
}

/// Cloneable handle for talking to a running [`Hub`](crate::Hub).
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<Command>,
    token: CancellationToken,
    default_max_retries: u32,
}

impl HubHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        token: CancellationToken,
        default_max_retries: u32,
    ) -> Self {
        Self {
            tx,
            token,
            default_max_retries,
        }
    }

    /// Registers (or extends) a subscription for `sub`.
    ///
    /// - `interest` must be non-empty; it is OR-ed into any existing mask.
    /// - `timer`, if given, creates or replaces the subscriber's recurring timer; the
    ///   first fire is one interval after the loop applies this command.
    ///
    /// Only a weak reference is kept: dropping every `Arc` to `sub` ends the subscription.
    pub fn subscribe<S: Subscribe>(
        &self,
        sub: &Arc<S>,
        interest: EventType,
        timer: Option<TimerSpec>,
    ) -> Result<SubscriptionHandle, HubError> {
        if interest.is_empty() {
            return Err(HubError::invalid("interest mask must be non-zero"));
        }
        if let Some(spec) = &timer {
            spec.validate()?;
        }

        let subscriber: Weak<dyn Subscribe> = Arc::downgrade(sub) as Weak<dyn Subscribe>;
        let name = sub.name();
        let handle = SubscriptionHandle::new(subscriber.clone(), name);
        self.send(Command::Subscribe {
            subscriber,
            name,
            interest,
            timer,
        })?;
        Ok(handle)
    }

    /// Removes a subscriber entirely (`mask = None`) or clears some of its bits.
    ///
    /// Unknown subscribers are ignored.
    pub fn unsubscribe(
        &self,
        who: impl Into<SubscriberKey>,
        mask: Option<EventType>,
    ) -> Result<(), HubError> {
        if mask.is_some_and(EventType::is_empty) {
            return Err(HubError::invalid("unsubscribe mask must be non-zero"));
        }
        self.send(Command::Unsubscribe {
            key: who.into(),
            mask,
        })
    }

    /// Publishes an event to every live subscriber whose mask intersects `kind`.
    pub fn publish(&self, kind: EventType, payload: Payload) -> Result<(), HubError> {
        self.publish_event(Event::with_payload(kind, payload))
    }

    /// Publishes a pre-built event.
    pub fn publish_event(&self, event: Event) -> Result<(), HubError> {
        if event.kind.is_empty() {
            return Err(HubError::invalid("event type must be non-zero"));
        }
        self.send(Command::Publish(event))
    }

    /// Tracks `content` until acknowledged and queues it for delivery.
    ///
    /// Returns the content-derived id. Queuing content that is already tracked returns
    /// the same id and does not queue it again. `priority` puts the delivery at the
    /// front of the queue instead of the back.
    pub fn queue_instruction(
        &self,
        content: impl Into<String>,
        max_retries: u32,
        priority: bool,
    ) -> Result<InstructionId, HubError> {
        let content = content.into();
        let id = InstructionId::from_content(&content);
        self.send(Command::Queue {
            content,
            max_retries,
            priority,
        })?;
        Ok(id)
    }

    /// [`queue_instruction`](Self::queue_instruction) with the configured default ceiling,
    /// at the back of the queue.
    pub fn queue_instruction_default(
        &self,
        content: impl Into<String>,
    ) -> Result<InstructionId, HubError> {
        self.queue_instruction(content, self.default_max_retries, false)
    }

    /// Stops retrying `id` and withdraws any of its deliveries not yet taken.
    ///
    /// Unknown or already acknowledged ids are ignored.
    pub fn acknowledge(&self, id: &InstructionId) -> Result<(), HubError> {
        self.send(Command::Acknowledge(id.clone()))
    }

    /// Takes the next delivery from the front of the queue.
    pub async fn next_delivery(&self) -> Result<Option<Delivery>, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::NextDelivery(tx))?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Returns a snapshot of hub state, after every command sent before it is applied.
    pub async fn snapshot(&self) -> Result<HubSnapshot, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Asks the loop to stop. Commands already queued may be dropped.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, cmd: Command) -> Result<(), HubError> {
        self.tx.send(cmd).map_err(|_| HubError::Closed)
    }
}
