//! # Tracked instructions.
//!
//! An instruction is identified by the SHA-256 of its original content, so queuing the
//! same text twice maps to the same [`InstructionId`].
//!
//! ## Lifecycle
//! ```text
//! queue ──► Sent(retry=0) ──[ack_timeout elapsed, queue idle]──► Retried(retry+1, escalated) ──► ...
//!   │             │                                                   │
//!   │             └──────────────── acknowledge ──────────────────────┴──► Acknowledged (gone)
//!   └─ retry+1 > max_retries at a sweep ──► Abandoned (gone, logged)
//! ```
//!
//! ## Escalation
//! | retry_count after increment | delivered content          |
//! |-----------------------------|----------------------------|
//! | 0, 1                        | original                   |
//! | 2                           | `**IMPORTANT:** ` + original |
//! | >= 3                        | `**URGENT:** ` + original  |

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Prefix used when an instruction is delivered for the second retry.
pub const IMPORTANT_PREFIX: &str = "**IMPORTANT:** ";

/// Prefix used from the third retry on.
pub const URGENT_PREFIX: &str = "**URGENT:** ";

/// Content-derived instruction identifier (lowercase hex SHA-256).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionId(String);

impl InstructionId {
    /// Derives the id of `content`.
    ///
    /// # Example
    /// ```
    /// use eventvisor::InstructionId;
    ///
    /// let a = InstructionId::from_content("reload templates");
    /// let b = InstructionId::from_content("reload templates");
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), 64);
    /// ```
    pub fn from_content(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstructionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `content` with the escalation prefix for `retry_count`.
///
/// The prefix is always applied to the original content, never stacked.
pub fn escalate(content: &str, retry_count: u32) -> String {
    match retry_count {
        0 | 1 => content.to_string(),
        2 => format!("{IMPORTANT_PREFIX}{content}"),
        _ => format!("{URGENT_PREFIX}{content}"),
    }
}

/// Delivery metadata for one unacknowledged instruction.
#[derive(Clone, Debug)]
pub(crate) struct PendingInstruction {
    pub id: InstructionId,
    /// Original, unprefixed content.
    pub content: String,
    pub created_at: Instant,
    pub last_sent_at: Instant,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Insertion order, used to keep sweeps deterministic.
    pub seq: u64,
}

impl PendingInstruction {
    /// Content as it should be delivered now.
    pub fn delivered_content(&self) -> String {
        escalate(&self.content, self.retry_count)
    }
}
