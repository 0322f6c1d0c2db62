//! # Hub: the single loop that owns every piece of mutable state.
//!
//! The [`Hub`] owns the subscription registry, the instruction tracker and the
//! built-in retry monitor. It is driven by one task running [`Hub::run`]:
//!
//! ```text
//! loop {
//!   fire_timers(now) if the earliest deadline has passed
//!   deadline = registry.next_deadline()          (None → no timer branch)
//!   select! {
//!     token.cancelled()        ─► stop
//!     mailbox.recv()           ─► apply(Command)  (subscribe / publish / queue / ack / query)
//!                                 None (all handles dropped) ─► stop
//!     sleep_until(deadline)    ─► fire_timers(now)
//!   }
//! }
//! ```
//!
//! ## Rules
//! - Dispatch is never interleaved: one command (or one timer pass) is fully applied
//!   before the next is taken.
//! - Any registry change is picked up on the next iteration, because the deadline is
//!   recomputed every time round the loop.
//! - A due timer fires once per wake, however late the wake was.
//! - Due timers are fired at the top of every iteration, so a steady stream of commands
//!   cannot hold them back.
//! - Commands emitted by handlers (through a [`HubHandle`]) queue behind the current dispatch.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::builder::HubBuilder;
use crate::core::config::HubConfig;
use crate::core::dispatch;
use crate::core::handle::{Command, HubHandle, HubSnapshot};
use crate::events::{Event, EventType};
use crate::instructions::{RetryMonitor, SweepReport, Tracker};
use crate::subscribers::{Registry, Subscribe, TimerSpec};

/// Event hub with timers and acknowledgement-tracked instructions.
///
/// Create one with [`Hub::new`] or [`Hub::builder`], hand out the returned [`HubHandle`],
/// then drive it with [`Hub::run`] or [`Hub::spawn`].
pub struct Hub {
    cfg: HubConfig,
    rx: mpsc::UnboundedReceiver<Command>,
    token: CancellationToken,
    registry: Registry,
    tracker: Tracker,
    /// Strong reference; the registry only holds a weak one.
    monitor: Arc<RetryMonitor>,
    last_sweep: Option<SweepReport>,
}

impl Hub {
    /// Creates a hub with `cfg` and its first handle.
    pub fn new(cfg: HubConfig) -> (Hub, HubHandle) {
        HubBuilder::new(cfg).build()
    }

    /// Returns a builder for finer control (external cancellation token).
    pub fn builder(cfg: HubConfig) -> HubBuilder {
        HubBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: HubConfig,
        rx: mpsc::UnboundedReceiver<Command>,
        token: CancellationToken,
        monitor: Arc<RetryMonitor>,
    ) -> Self {
        Self {
            cfg,
            rx,
            token,
            registry: Registry::new(),
            tracker: Tracker::new(),
            monitor,
            last_sweep: None,
        }
    }

    /// Spawns [`Hub::run`] on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the loop until cancelled or until every [`HubHandle`] is dropped.
    pub async fn run(mut self) {
        self.install_retry_monitor(Instant::now());
        info!(
            retry_tick = ?self.cfg.retry_tick_clamped(),
            ack_timeout = ?self.cfg.ack_timeout,
            "hub loop started"
        );

        let token = self.token.clone();
        loop {
            // Due timers go first so a busy mailbox cannot starve them.
            let now = Instant::now();
            if self.registry.next_deadline().is_some_and(|d| d <= now) {
                self.fire_timers(now);
            }

            let deadline = self.registry.next_deadline();
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("hub loop cancelled");
                    break;
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => {
                        info!("all hub handles dropped; hub loop stopping");
                        break;
                    }
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_timers(Instant::now());
                }
            }
        }

        self.rx.close();
        info!(
            pending = self.tracker.pending_len(),
            queued = self.tracker.queued_len(),
            "hub loop stopped"
        );
    }

    /// Registers the retry monitor with an empty mask: it only ever receives its own
    /// addressed timer fires, never a published event.
    fn install_retry_monitor(&mut self, now: Instant) {
        let timer = TimerSpec::new(self.cfg.retry_tick_clamped(), EventType::EMPTY);
        if let Err(err) = timer.validate() {
            warn!(%err, "retry monitor not installed; instructions will not be retried");
            return;
        }
        let weak: Weak<dyn Subscribe> = Arc::downgrade(&self.monitor) as Weak<dyn Subscribe>;
        self.registry
            .subscribe(weak, self.monitor.name(), EventType::EMPTY, Some(timer), now);
    }

    fn apply(&mut self, cmd: Command) {
        let now = Instant::now();
        match cmd {
            Command::Subscribe {
                subscriber,
                name,
                interest,
                timer,
            } => {
                self.registry.subscribe(subscriber, name, interest, timer, now);
            }
            Command::Unsubscribe { key, mask } => {
                if !self.registry.unsubscribe(key, mask) {
                    debug!(?key, "unsubscribe for unknown subscriber ignored");
                }
            }
            Command::Publish(event) => self.publish(&event),
            Command::Queue {
                content,
                max_retries,
                priority,
            } => {
                self.tracker.queue(content, max_retries, priority, now);
            }
            Command::Acknowledge(id) => {
                if !self.tracker.acknowledge(&id) {
                    debug!(%id, "acknowledge for unknown instruction ignored");
                }
            }
            Command::RetrySweep => self.sweep(now),
            Command::NextDelivery(reply) => {
                let next = self.tracker.pop_delivery();
                if let Err(Some(unclaimed)) = reply.send(next) {
                    self.tracker.restore_delivery(unclaimed);
                }
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot(now));
            }
        }
    }

    fn publish(&mut self, event: &Event) {
        let targets = self.registry.matching(event.kind);
        let report = dispatch::deliver(targets, event);
        debug!(
            event = %event.kind,
            seq = event.seq,
            delivered = report.delivered,
            failed = report.failed,
            "event dispatched"
        );
    }

    fn fire_timers(&mut self, now: Instant) {
        for fire in self.registry.take_due(now) {
            let event = Event::new(fire.kind);
            debug!(
                subscriber = fire.target.name,
                key = ?fire.target.key,
                event = %event.kind,
                "timer fired"
            );
            dispatch::deliver(vec![fire.target], &event);
        }
    }

    fn sweep(&mut self, now: Instant) {
        let report = self.tracker.sweep(now, self.cfg.ack_timeout);
        if !report.retried.is_empty() || !report.abandoned.is_empty() {
            info!(
                retried = report.retried.len(),
                abandoned = report.abandoned.len(),
                "retry sweep applied"
            );
        }
        self.last_sweep = Some(report);
    }

    fn snapshot(&self, now: Instant) -> HubSnapshot {
        HubSnapshot {
            subscriptions: self.registry.len(),
            timers: self.registry.timer_count(),
            queued: self.tracker.queued_len(),
            pending: self.tracker.snapshot(now),
            last_sweep: self.last_sweep.clone(),
        }
    }
}
