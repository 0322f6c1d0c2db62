//! # LogWriter: simple event logger
//!
//! A minimal subscriber that logs every event it receives through `tracing`.
//! Use it for demos or while wiring up a new event type.
//!
//! ## Example output
//! ```text
//! INFO eventvisor: [event] kind=0x2 seq=17 fields=["phase"]
//! INFO eventvisor: [timer] kind=0x8000000000000002 seq=18
//! ```

use tracing::info;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) -> Result<(), HandlerError> {
        if e.is_timer() {
            info!(target: "eventvisor", "[timer] kind={} seq={}", e.kind, e.seq);
        } else {
            let fields: Vec<&str> = e.payload.keys().map(String::as_str).collect();
            info!(target: "eventvisor", "[event] kind={} seq={} fields={:?}", e.kind, e.seq, fields);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
