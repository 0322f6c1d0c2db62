//! # eventvisor
//!
//! **Eventvisor** is a small coordination core for background work inside an application:
//! components subscribe to categories of events (including recurring timers), and producers
//! push instructions to a remote consumer that are retried, with escalating urgency, until
//! acknowledged or abandoned.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers / handlers                                   host transport
//!   ┌──────────────┐ ┌──────────────┐                     ┌──────────────┐
//!   │  HubHandle   │ │  HubHandle   │                     │  HubHandle   │
//!   │ publish/sub  │ │ queue/ack    │                     │ next_delivery│
//!   └──────┬───────┘ └──────┬───────┘                     └──────┬───────┘
//!          └────────────────┴──────────┬─────────────────────────┘
//!                                      ▼  Command mailbox (single consumer)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Hub::run (one task, owns all state)                              │
//! │  - Registry   (Weak subscribers, interest masks, timers)          │
//! │  - Dispatcher (AND-match fan-out, failure isolation)              │
//! │  - Tracker    (pending instructions + delivery queue)             │
//! │  - RetryMonitor (timer subscriber → retry sweep)                  │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        ▼                              ▼
//!   sub.on_event(&Event)          Delivery { id, content, retry_count }
//! ```
//!
//! ### Instruction lifecycle
//! ```text
//! queue_instruction(content, max_retries) ──► id = sha256(content)
//!   ├─ already tracked ─► return id (no new delivery)
//!   └─ track(retry=0), push delivery (front if priority)
//!
//! every retry_tick (60s), if the delivery queue is empty:
//!   for each instruction with now - last_sent >= ack_timeout (30s):
//!     ├─ retry + 1 > max_retries ─► abandon (warn!, dropped)
//!     └─ retry += 1, re-queue escalated content:
//!          retry 1 → as is, retry 2 → "**IMPORTANT:** ", retry ≥ 3 → "**URGENT:** "
//!
//! acknowledge(id) at any time ─► stop tracking (unknown ids ignored)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Subscriber API**| Bitmask subscriptions and per-subscriber recurring timers.   | [`Subscribe`], [`TimerSpec`], [`EventType`]|
//! | **Hub**           | Single-loop scheduler and dispatcher.                        | [`Hub`], [`HubHandle`], [`HubBuilder`]     |
//! | **Instructions**  | Ack-tracked delivery with escalation and abandonment.        | [`InstructionId`], [`Delivery`]            |
//! | **Errors**        | Typed errors for callers and handlers.                       | [`HubError`], [`HandlerError`]             |
//! | **Configuration** | Retry cadence and defaults.                                  | [`HubConfig`]                              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventvisor::{Event, EventType, HandlerError, Hub, HubConfig, Payload, Subscribe};
//!
//! const CONTENT_SAVED: EventType = EventType::new(0b0001);
//!
//! #[derive(Default)]
//! struct Saves(AtomicUsize);
//!
//! impl Subscribe for Saves {
//!     fn on_event(&self, _ev: &Event) -> Result<(), HandlerError> {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (hub, handle) = Hub::new(HubConfig::default());
//!     let join = hub.spawn();
//!
//!     let saves = Arc::new(Saves::default());
//!     handle.subscribe(&saves, CONTENT_SAVED, None)?;
//!     handle.publish(CONTENT_SAVED, Payload::new())?;
//!
//!     let id = handle.queue_instruction("rebuild index", 3, false)?;
//!     let delivery = handle.next_delivery().await?.expect("queued");
//!     assert_eq!(delivery.id, id);
//!     handle.acknowledge(&id)?;
//!
//!     handle.snapshot().await?;
//!     assert_eq!(saves.0.load(Ordering::Relaxed), 1);
//!
//!     handle.shutdown();
//!     join.await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod instructions;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Hub, HubBuilder, HubConfig, HubHandle, HubSnapshot};
pub use error::{HandlerError, HubError};
pub use events::{Event, EventType, Payload};
pub use instructions::{
    Delivery, IMPORTANT_PREFIX, InstructionId, PendingSnapshot, SweepReport, URGENT_PREFIX,
    escalate,
};
pub use subscribers::{MAX_INTERVAL, Subscribe, SubscriberKey, SubscriptionHandle, TimerSpec};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
