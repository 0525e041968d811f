//! In-process bus backed by a channel

use crate::transport::traits::Bus;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Bus fed directly through an `mpsc` sender
pub struct ChannelBus {
    rx: mpsc::Receiver<String>,
}

impl ChannelBus {
    /// Create a bus and the sender that feeds it
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { rx }, tx)
    }
}

#[async_trait]
impl Bus for ChannelBus {
    async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    fn name(&self) -> &'static str {
        "Channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_bus_delivers_in_order() {
        let (mut bus, tx) = ChannelBus::new(4);
        tx.send("d1:ping".into()).await.expect("send failed");
        tx.send("d1:seekbar_changed:progress=1".into()).await.expect("send failed");
        drop(tx);

        assert_eq!(bus.recv().await.as_deref(), Some("d1:ping"));
        assert_eq!(bus.recv().await.as_deref(), Some("d1:seekbar_changed:progress=1"));
        assert_eq!(bus.recv().await, None);
        assert_eq!(bus.name(), "Channel");
    }
}
