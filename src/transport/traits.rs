//! Trait abstractions for the bus and the downstream parameter surface

use async_trait::async_trait;

/// Inbound half of the shared command bus
///
/// Messages arrive one at a time. There is no ordering guarantee across
/// devices, but each physical link is FIFO.
#[async_trait]
pub trait Bus: Send {
    /// Wait for the next raw message; `None` once the bus is gone
    async fn recv(&mut self) -> Option<String>;

    /// Human-readable name for this bus
    fn name(&self) -> &'static str;
}

/// Downstream control surface that accepts named numeric parameters
///
/// Fire-and-forget: implementations never block and never report delivery.
pub trait ParameterSink: Send + Sync {
    fn send_parameter(&self, name: &str, value: f64);
}
