#![allow(dead_code)]

use std::sync::Mutex;

use eventvisor::{Event, EventType, HandlerError, Subscribe};
use tracing_subscriber::EnvFilter;

pub const PHASE: EventType = EventType::new(0b0001);
pub const TICK: EventType = EventType::new(0b0010);
pub const SAVED: EventType = EventType::new(0b0100);
pub const OTHER: EventType = EventType::new(0b1000);

/// Installs a test log writer once; `RUST_LOG=eventvisor=debug` shows hub internals.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records every event kind it receives.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<EventType>>,
}

impl Recorder {
    pub fn kinds(&self) -> Vec<EventType> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn timer_count(&self) -> usize {
        self.kinds().iter().filter(|k| k.is_timer()).count()
    }
}

impl Subscribe for Recorder {
    fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        self.seen.lock().unwrap().push(event.kind);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
