//! Router loop: decode each inbound message and hand it to the dispatcher
//!
//! Malformed input is logged and dropped, never replied to or retried.

use crate::command::{DispatchOutcome, Dispatcher};
use crate::transport::Bus;
use router_shared::codec;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Drives the dispatcher from a bus
pub struct Router {
    dispatcher: Dispatcher,
}

impl Router {
    /// Create a new router around a dispatcher
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle one raw message; `None` if it was dropped as malformed
    pub async fn handle_raw(&self, raw: &str) -> Option<DispatchOutcome> {
        let msg = match codec::decode(raw) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Dropping malformed command {:?}: {}", raw, e);
                return None;
            }
        };

        debug!(
            "Received: token={} trigger={} args={:?}",
            msg.device_token, msg.trigger, msg.args
        );

        Some(self.dispatcher.dispatch(&msg, raw).await)
    }

    /// Process messages until the bus closes or shutdown is signalled
    pub async fn run<B: Bus>(&self, bus: &mut B, mut shutdown: watch::Receiver<bool>) {
        info!("Router reading from {} bus", bus.name());

        loop {
            tokio::select! {
                raw = bus.recv() => match raw {
                    Some(raw) => {
                        if let Some(outcome) = self.handle_raw(&raw).await {
                            log_outcome(&outcome);
                        }
                    }
                    None => {
                        warn!("Bus closed");
                        break;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }

        info!("Router stopped");
    }
}

fn log_outcome(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Alive { index } => debug!("  -> alive (index {})", index),
        DispatchOutcome::Handled { index } => debug!("  -> handled (index {})", index),
        DispatchOutcome::Rejected { index, error } => {
            debug!("  -> rejected (index {}): {}", index, error)
        }
    }
}
