//! Acknowledgement-tracked instructions.
//!
//! ## Contents
//! - [`InstructionId`], [`escalate`] content identity and urgency prefixes
//! - [`Delivery`], [`PendingSnapshot`], [`SweepReport`] views handed out by the hub
//! - `Tracker` loop-owned pending map plus delivery queue
//! - `RetryMonitor` built-in timer subscriber that triggers sweeps

mod pending;
mod retry;
mod tracker;

pub use pending::{IMPORTANT_PREFIX, InstructionId, URGENT_PREFIX, escalate};
pub(crate) use retry::RetryMonitor;
pub(crate) use tracker::Tracker;
pub use tracker::{Delivery, PendingSnapshot, SweepReport};
