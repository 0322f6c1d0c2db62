//! Events: the bitmask type and the event envelope.
//!
//! ## Contents
//! - [`EventType`] opaque bitmask with one reserved timer bit
//! - [`Event`], [`Payload`] envelope handed to subscribers
//!
//! ## Quick reference
//! - **Publishers**: any [`HubHandle`](crate::HubHandle) holder, and the hub loop itself
//!   for timer events.
//! - **Consumers**: [`Subscribe`](crate::Subscribe) implementations, through the dispatcher.

mod event;
mod kind;

pub use event::{Event, Payload};
pub use kind::EventType;
