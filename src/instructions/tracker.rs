//! # Instruction tracker and delivery queue.
//!
//! The [`Tracker`] maps [`InstructionId`]s to delivery metadata and owns the
//! delivery queue that the host drains (via [`HubHandle::next_delivery`](crate::HubHandle::next_delivery))
//! and hands to its transport.
//!
//! ## Rules
//! - At most one pending record per id; queuing known content is a no-op returning the id.
//! - `acknowledge` of an unknown id is a no-op; a known id also loses its queued deliveries.
//! - A sweep does nothing while the delivery queue is non-empty.
//! - A sweep retries records whose `last_sent_at` is at least `ack_timeout` old, or abandons
//!   them when the next retry would exceed `max_retries`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::instructions::pending::{InstructionId, PendingInstruction};

/// Instruction content ready to be handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Id to acknowledge once the peer confirms receipt.
    pub id: InstructionId,
    /// Content to transmit (escalation prefix already applied).
    pub content: String,
    /// Number of retries this delivery represents (0 = initial send).
    pub retry_count: u32,
}

/// Read-only view of one tracked instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingSnapshot {
    pub id: InstructionId,
    /// Original, unprefixed content.
    pub content: String,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Time since the last (re)send.
    pub since_last_sent: Duration,
    /// Time since the instruction was first queued.
    pub age: Duration,
}

/// Outcome of one retry sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// `true` if the sweep was skipped because deliveries were still queued.
    pub skipped_busy: bool,
    /// Ids re-queued this sweep.
    pub retried: Vec<InstructionId>,
    /// Ids dropped because their retry ceiling was reached.
    pub abandoned: Vec<InstructionId>,
}

/// Loop-owned tracker of unacknowledged instructions.
#[derive(Default)]
pub(crate) struct Tracker {
    pending: HashMap<InstructionId, PendingInstruction>,
    queue: VecDeque<Delivery>,
    next_seq: u64,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `content` and queues it for delivery (front if `priority`).
    ///
    /// Known content is not re-queued; the existing id is returned.
    pub fn queue(
        &mut self,
        content: String,
        max_retries: u32,
        priority: bool,
        now: Instant,
    ) -> InstructionId {
        let id = InstructionId::from_content(&content);
        if self.pending.contains_key(&id) {
            debug!(%id, "instruction already tracked; not re-queued");
            return id;
        }

        let delivery = Delivery {
            id: id.clone(),
            content: content.clone(),
            retry_count: 0,
        };
        if priority {
            self.queue.push_front(delivery);
        } else {
            self.queue.push_back(delivery);
        }

        self.next_seq += 1;
        self.pending.insert(
            id.clone(),
            PendingInstruction {
                id: id.clone(),
                content,
                created_at: now,
                last_sent_at: now,
                retry_count: 0,
                max_retries,
                seq: self.next_seq,
            },
        );
        debug!(%id, max_retries, priority, "instruction queued");
        id
    }

    /// Stops tracking `id` and drops any of its deliveries still waiting in the queue.
    ///
    /// Returns `true` if it was tracked.
    pub fn acknowledge(&mut self, id: &InstructionId) -> bool {
        let known = self.pending.remove(id).is_some();
        if known {
            let before = self.queue.len();
            self.queue.retain(|d| d.id != *id);
            debug!(%id, purged = before - self.queue.len(), "instruction acknowledged");
        }
        known
    }

    /// Pops the next delivery.
    pub fn pop_delivery(&mut self) -> Option<Delivery> {
        self.queue.pop_front()
    }

    /// Puts a delivery back at the front (the requester went away before taking it).
    pub fn restore_delivery(&mut self, delivery: Delivery) {
        self.queue.push_front(delivery);
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_tracked(&self, id: &InstructionId) -> bool {
        self.pending.contains_key(id)
    }

    /// Retries or abandons overdue instructions, unless deliveries are still queued.
    pub fn sweep(&mut self, now: Instant, ack_timeout: Duration) -> SweepReport {
        let mut report = SweepReport::default();
        if !self.queue.is_empty() {
            debug!(queued = self.queue.len(), "retry sweep skipped; delivery queue busy");
            report.skipped_busy = true;
            return report;
        }

        let mut overdue: Vec<(u64, InstructionId)> = self
            .pending
            .values()
            .filter(|p| now.saturating_duration_since(p.last_sent_at) >= ack_timeout)
            .map(|p| (p.seq, p.id.clone()))
            .collect();
        overdue.sort_unstable();

        for (_, id) in overdue {
            let Some(entry) = self.pending.get_mut(&id) else {
                continue;
            };

            if entry.retry_count.saturating_add(1) > entry.max_retries {
                if let Some(dropped) = self.pending.remove(&id) {
                    warn!(
                        %id,
                        retries = dropped.retry_count,
                        max_retries = dropped.max_retries,
                        content = %dropped.content,
                        "instruction abandoned after exhausting retries"
                    );
                }
                report.abandoned.push(id);
                continue;
            }

            entry.retry_count += 1;
            entry.last_sent_at = now;
            let delivery = Delivery {
                id: id.clone(),
                content: entry.delivered_content(),
                retry_count: entry.retry_count,
            };
            debug!(%id, retry_count = entry.retry_count, "instruction re-queued");
            self.queue.push_back(delivery);
            report.retried.push(id);
        }
        report
    }

    /// Snapshot of tracked instructions, oldest first.
    pub fn snapshot(&self, now: Instant) -> Vec<PendingSnapshot> {
        let mut rows: Vec<&PendingInstruction> = self.pending.values().collect();
        rows.sort_unstable_by_key(|p| p.seq);
        rows.into_iter()
            .map(|p| PendingSnapshot {
                id: p.id.clone(),
                content: p.content.clone(),
                retry_count: p.retry_count,
                max_retries: p.max_retries,
                since_last_sent: now.saturating_duration_since(p.last_sent_at),
                age: now.saturating_duration_since(p.created_at),
            })
            .collect()
    }
}
