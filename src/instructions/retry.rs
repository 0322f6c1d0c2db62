//! # Retry monitor.
//!
//! Built-in subscriber registered by the hub on its own recurring timer
//! ([`HubConfig::retry_tick`](crate::HubConfig::retry_tick), 60s by default).
//! On each tick it asks the loop to run a retry sweep over the tracker.
//!
//! ```text
//! timer (retry_tick) ──► RetryMonitor::on_event ──► mailbox: RetrySweep
//!                                                       │
//!                                     hub loop ──► Tracker::sweep(now, ack_timeout)
//! ```
//!
//! The monitor is registered with an empty interest mask, so published events never
//! reach it, including ones that carry the timer bit. Only its own ticks do.
//!
//! The monitor only holds a weak mailbox sender, so it never keeps the loop alive.

use tokio::sync::mpsc::WeakUnboundedSender;

use crate::core::Command;
use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

pub(crate) struct RetryMonitor {
    mailbox: WeakUnboundedSender<Command>,
}

impl RetryMonitor {
    pub fn new(mailbox: WeakUnboundedSender<Command>) -> Self {
        Self { mailbox }
    }
}

impl Subscribe for RetryMonitor {
    fn on_event(&self, _event: &Event) -> Result<(), HandlerError> {
        let Some(tx) = self.mailbox.upgrade() else {
            return Ok(());
        };
        tx.send(Command::RetrySweep)
            .map_err(|_| HandlerError::failed("mailbox closed before retry sweep"))
    }

    fn name(&self) -> &'static str {
        "retry-monitor"
    }
}
