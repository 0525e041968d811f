//! Outbound half of the bus

use router_shared::Message;
use tokio::sync::mpsc;
use tracing::warn;

/// Cloneable, non-blocking handle for publishing commands on the bus
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    /// Create an outbox and the receiver a bus drains it from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Encode and publish a message
    pub fn send(&self, message: &Message) {
        self.send_raw(message.encode());
    }

    /// Publish an already encoded command
    pub fn send_raw(&self, raw: String) {
        if let Err(e) = self.tx.send(raw) {
            warn!("Outbound bus closed, dropping {:?}", e.0);
        }
    }
}
