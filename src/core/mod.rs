//! Hub core: loop, mailbox and dispatch.
//!
//! Public API from this module is [`Hub`], [`HubBuilder`], [`HubHandle`], [`HubConfig`]
//! and [`HubSnapshot`].
//!
//! Internal modules:
//! - [`hub`]: the loop that owns registry and tracker state, and fires timers;
//! - [`handle`]: the mailbox front-end and its command set;
//! - [`dispatch`]: synchronous fan-out with failure isolation;
//! - [`builder`]: wires channel, token and retry monitor together;
//! - [`config`]: retry cadence and defaults.
//!
//! ## Wiring
//! ```text
//!  HubHandle (clone per producer/subscriber)
//!      │ Command (unbounded mpsc, FIFO)
//!      ▼
//!  Hub::run ──► Registry ──► dispatch::deliver ──► Subscribe::on_event
//!      │            ▲                                   │
//!      │            └──── timers (TIMER bit) ───────────┤
//!      ▼                                                ▼
//!  Tracker ◄────────────── RetrySweep ◄──────────── RetryMonitor
//! ```

mod builder;
mod config;
mod dispatch;
mod handle;
mod hub;

pub use builder::HubBuilder;
pub use config::HubConfig;
pub(crate) use handle::Command;
pub use handle::{HubHandle, HubSnapshot};
pub use hub::Hub;
