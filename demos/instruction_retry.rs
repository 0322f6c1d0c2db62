//! # Example: instruction_retry
//!
//! Demonstrates the instruction lifecycle against a flaky consumer.
//!
//! Shows how to:
//! - Attach the built-in [`LogWriter`] with a recurring timer.
//! - Queue instructions and drain them through [`HubHandle::next_delivery`].
//! - Let the retry monitor escalate unacknowledged instructions and finally abandon them.
//!
//! ## Flow
//! ```text
//! queue_instruction("compact logs") ──► Delivery(retry 0)
//!     consumer ignores it
//! retry tick ──► Delivery(retry 1) ──► Delivery("**IMPORTANT:** …") ──► Delivery("**URGENT:** …")
//!     consumer acknowledges urgent deliveries only
//! queue_instruction("rotate keys", max_retries = 1) ──► abandoned (warn!) after one retry
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example instruction_retry --features logging
//! ```

use std::{sync::Arc, time::Duration};

use eventvisor::{EventType, Hub, HubConfig, HubHandle, LogWriter, Payload, TimerSpec, URGENT_PREFIX};
use tracing_subscriber::EnvFilter;

const HEARTBEAT: EventType = EventType::new(0b0001);
const PHASE: EventType = EventType::new(0b0010);

/// Pretends to be a remote agent that only reacts when shouted at.
async fn consumer(handle: HubHandle, rounds: usize) -> anyhow::Result<()> {
    for _ in 0..rounds {
        while let Some(delivery) = handle.next_delivery().await? {
            println!(
                "[consumer] got {} (retry {}): {}",
                &delivery.id.as_str()[..8],
                delivery.retry_count,
                delivery.content
            );
            if delivery.content.starts_with(URGENT_PREFIX) {
                handle.acknowledge(&delivery.id)?;
                println!("[consumer] acknowledged {}", &delivery.id.as_str()[..8]);
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = HubConfig {
        retry_tick: Duration::from_secs(2),
        ack_timeout: Duration::from_secs(1),
        default_max_retries: 3,
    };
    let (hub, handle) = Hub::new(cfg);
    let join = hub.spawn();

    let logger = Arc::new(LogWriter::new());
    let heartbeat = TimerSpec::from_secs_f64(3.0, HEARTBEAT)?;
    handle.subscribe(&logger, PHASE, Some(heartbeat))?;

    let mut payload = Payload::new();
    payload.insert("phase".into(), "maintenance".into());
    handle.publish(PHASE, payload)?;

    handle.queue_instruction_default("compact logs")?;
    handle.queue_instruction("rotate keys", 1, true)?;

    consumer(handle.clone(), 20).await?;

    let snap = handle.snapshot().await?;
    println!("[main] snapshot: {}", serde_json::to_string_pretty(&snap)?);

    handle.shutdown();
    join.await?;
    Ok(())
}
