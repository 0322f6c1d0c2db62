use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{config::HubConfig, handle::HubHandle, hub::Hub};
use crate::instructions::RetryMonitor;

/// Builder for constructing a [`Hub`] with optional wiring.
pub struct HubBuilder {
    cfg: HubConfig,
    token: Option<CancellationToken>,
}

impl HubBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: HubConfig) -> Self {
        Self { cfg, token: None }
    }

    /// Stops the hub when `token` (or a parent of it) is cancelled.
    ///
    /// Without this the hub gets its own token, reachable through [`HubHandle::shutdown`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Builds the hub and its first handle.
    ///
    /// Nothing runs until [`Hub::run`] or [`Hub::spawn`] is called; commands sent through
    /// the handle before that are buffered in the mailbox.
    pub fn build(self) -> (Hub, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.token.unwrap_or_default();

        let monitor = Arc::new(RetryMonitor::new(tx.downgrade()));
        let handle = HubHandle::new(tx, token.clone(), self.cfg.default_max_retries);
        let hub = Hub::from_parts(self.cfg, rx, token, monitor);
        (hub, handle)
    }
}
