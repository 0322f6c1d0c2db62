//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, subscriber identity, recurring
//! timers, and the registry the hub loop keeps them in.
//!
//! ## Architecture
//! ```text
//! HubHandle::subscribe(&Arc<S>, mask, timer?)
//!        │  (Weak<dyn Subscribe> sent through the mailbox)
//!        ▼
//! Registry  [ key │ Weak │ interest │ timer? ] ... (registration order)
//!        │
//!        ├──► matching(kind)  ──► Dispatcher ──► sub.on_event(&Event)
//!        └──► take_due(now)   ──► Dispatcher ──► owner.on_event(&timer Event)
//! ```

mod registry;
mod subscribe;
mod timer;

#[cfg(feature = "logging")]
mod log;

pub(crate) use registry::{Registry, Target};
pub use subscribe::{Subscribe, SubscriberKey, SubscriptionHandle};
pub use timer::{MAX_INTERVAL, TimerSpec};

#[cfg(feature = "logging")]
pub use log::LogWriter;
