//! Parameter sinks for the downstream control surface

use crate::transport::traits::ParameterSink;
use anyhow::{anyhow, Result};
use router_shared::codec::KEY_VALUE_SEPARATOR;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Sends each parameter as a `name=value` text datagram
pub struct UdpParameterSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpParameterSink {
    /// Bind an ephemeral socket and connect it to the control surface
    pub async fn connect(address: &str) -> Result<Self> {
        let target = tokio::net::lookup_host(address)
            .await?
            .next()
            .ok_or_else(|| anyhow!("No address found for parameter target: {}", address))?;

        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(target).await?;

        Ok(Self { socket, target })
    }

    /// Address parameters are sent to
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl ParameterSink for UdpParameterSink {
    fn send_parameter(&self, name: &str, value: f64) {
        let datagram = format!("{name}{KEY_VALUE_SEPARATOR}{value}");
        match self.socket.try_send(datagram.as_bytes()) {
            Ok(_) => debug!("Parameter {} = {} -> {}", name, value, self.target),
            Err(e) => warn!("Failed to send parameter {} to {}: {}", name, self.target, e),
        }
    }
}

/// Logs parameter updates instead of sending them anywhere
#[derive(Debug, Default)]
pub struct LogParameterSink;

impl ParameterSink for LogParameterSink {
    fn send_parameter(&self, name: &str, value: f64) {
        info!("Parameter {} = {}", name, value);
    }
}

/// Records parameter updates for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: std::sync::Mutex<Vec<(String, f64)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn sent(&self) -> Vec<(String, f64)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ParameterSink for RecordingSink {
    fn send_parameter(&self, name: &str, value: f64) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((name.to_owned(), value));
        }
    }
}
