//! # Synchronous fan-out to subscribers.
//!
//! ```text
//! deliver(targets, &event)
//!     ├──► target1.on_event(&event) ──► Ok
//!     ├──► target2.on_event(&event) ──► Err / panic → warn!, continue
//!     └──► targetN.on_event(&event) ──► Ok
//! ```
//!
//! ## Rules
//! - Targets are invoked in the order given (registration order).
//! - Each handler runs to completion before the next starts.
//! - Errors and panics are terminal here: logged with subscriber name and event type.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Target;

/// Counts for one dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Invokes every target with `event`, isolating failures.
pub(crate) fn deliver(targets: Vec<Target>, event: &Event) -> DispatchReport {
    let mut report = DispatchReport::default();
    for target in targets {
        match invoke(&target, event) {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                warn!(
                    subscriber = target.name,
                    event = %event.kind,
                    seq = event.seq,
                    label = err.as_label(),
                    "subscriber handler failed: {err}"
                );
            }
        }
    }
    report
}

fn invoke(target: &Target, event: &Event) -> Result<(), HandlerError> {
    match catch_unwind(AssertUnwindSafe(|| target.subscriber.on_event(event))) {
        Ok(res) => res,
        Err(panic_err) => Err(HandlerError::Panicked {
            info: panic_message(&*panic_err),
        }),
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
