//! Liveness Sweeper
//!
//! Runs a background loop that pings every registered device once per
//! period and evicts the ones that stayed silent for the whole round.
//! Devices answer with ordinary `ping` commands handled by the dispatcher;
//! there is no reply channel tied to a specific ping.

use super::registry::SharedRegistry;
use crate::transport::Outbox;
use router_shared::{liveness, Message};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Periodically probes devices and evicts non-responders
pub struct LivenessSweeper {
    registry: SharedRegistry,
    outbox: Outbox,
    period: Duration,
}

impl LivenessSweeper {
    /// Create a sweeper with the default period
    pub fn new(registry: SharedRegistry, outbox: Outbox) -> Self {
        Self {
            registry,
            outbox,
            period: Duration::from_millis(liveness::SWEEP_PERIOD_MS),
        }
    }

    /// Set the sweep period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run one complete round: reset, ping, wait, evict
    pub async fn run_round(&self) -> Vec<String> {
        self.start_round().await;
        sleep(self.period).await;
        self.finish_round().await
    }

    /// Start the sweep loop; returns when shutdown is signalled
    ///
    /// A shutdown during the wait abandons the round without evicting.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Liveness sweeper started (period: {:?})", self.period);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = self.run_round() => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Liveness sweeper stopped");
    }

    async fn start_round(&self) {
        let devices = self.registry.begin_sweep_round().await;
        debug!("Sweep round started, pinging {} device(s)", devices.len());

        for (index, token) in &devices {
            debug!("  ping -> {} (index {})", token, index);
            self.outbox.send(&Message::ping(token.as_str()));
        }
    }

    async fn finish_round(&self) -> Vec<String> {
        let evicted = self.registry.end_sweep_round().await;

        for token in &evicted {
            info!("Evicted unresponsive device {}", token);
        }
        let remaining = self.registry.tokens().await;
        debug!(
            "Sweep round finished, {} device(s) remain: {:?}",
            remaining.len(),
            remaining
        );

        evicted
    }
}
