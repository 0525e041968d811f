//! TCP bus: every accepted connection is a link onto the shared bus
//!
//! Inbound lines from all links are funnelled into one queue. Every outbound
//! line is queued to every open link; devices pick out the commands carrying
//! their own token. Each link has its own writer task, so a device that stops
//! reading only ever stalls itself. Once its queue is full it is dropped.

use crate::config::BusConfig;
use crate::transport::traits::Bus;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use router_shared::codec::{self, LineDecoder};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

type Links = Arc<Mutex<HashMap<SocketAddr, mpsc::Sender<Bytes>>>>;

/// Bus served over plain TCP with newline-delimited commands
pub struct TcpBus {
    inbound_rx: mpsc::Receiver<String>,
    local_addr: SocketAddr,
}

impl TcpBus {
    /// Bind the listener and start the accept and broadcast tasks
    pub async fn bind(
        config: &BusConfig,
        outbound_rx: mpsc::UnboundedReceiver<String>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen).await?;
        let local_addr = listener.local_addr()?;
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
        let links: Links = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(accept_loop(
            listener,
            links.clone(),
            inbound_tx,
            config.link_queue_capacity,
        ));
        tokio::spawn(broadcast_loop(outbound_rx, links));

        Ok(Self {
            inbound_rx,
            local_addr,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Bus for TcpBus {
    async fn recv(&mut self) -> Option<String> {
        self.inbound_rx.recv().await
    }

    fn name(&self) -> &'static str {
        "TCP"
    }
}

async fn accept_loop(
    listener: TcpListener,
    links: Links,
    inbound_tx: mpsc::Sender<String>,
    queue_capacity: usize,
) {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                info!("Link opened: {}", addr);
                tokio::spawn(serve_link(
                    addr,
                    socket,
                    links.clone(),
                    inbound_tx.clone(),
                    queue_capacity,
                ));
            }
            Err(e) => {
                warn!("Accept error: {}", e);
            }
        }
    }
}

/// Run one link until either direction ends
async fn serve_link(
    addr: SocketAddr,
    socket: TcpStream,
    links: Links,
    inbound_tx: mpsc::Sender<String>,
    queue_capacity: usize,
) {
    let (reader, writer) = socket.into_split();
    let (link_tx, link_rx) = mpsc::channel(queue_capacity);
    links.lock().await.insert(addr, link_tx);

    tokio::select! {
        _ = read_link(addr, reader, inbound_tx) => {}
        _ = write_link(addr, writer, link_rx) => {}
    }

    links.lock().await.remove(&addr);
    info!("Link closed: {}", addr);
}

/// Forward complete lines from one link to the inbound queue
async fn read_link(addr: SocketAddr, mut reader: OwnedReadHalf, inbound_tx: mpsc::Sender<String>) {
    let mut decoder = LineDecoder::new();
    let mut read_buf = vec![0u8; 4096];

    loop {
        match reader.read(&mut read_buf).await {
            Ok(0) => return,
            Ok(n) => {
                decoder.extend(&read_buf[..n]);

                // Process all complete lines
                loop {
                    match decoder.decode_next() {
                        Ok(Some(line)) if line.trim().is_empty() => {}
                        Ok(Some(line)) => {
                            if inbound_tx.send(line).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => warn!("Dropping bad line from {}: {}", addr, e),
                    }
                }
            }
            Err(e) => {
                warn!("Read error from {}: {}", addr, e);
                return;
            }
        }
    }
}

/// Drain one link's queue onto its socket; ends when the queue is dropped
async fn write_link(addr: SocketAddr, mut writer: OwnedWriteHalf, mut link_rx: mpsc::Receiver<Bytes>) {
    while let Some(line) = link_rx.recv().await {
        if let Err(e) = writer.write_all(&line).await {
            warn!("Write error to {}: {}", addr, e);
            return;
        }
    }
}

/// Queue every outbound line on every open link without waiting on sockets
async fn broadcast_loop(mut outbound_rx: mpsc::UnboundedReceiver<String>, links: Links) {
    while let Some(raw) = outbound_rx.recv().await {
        let line: Bytes = codec::encode_line(&raw);
        let mut links = links.lock().await;

        links.retain(|addr, link| match link.try_send(line.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Link {} is not reading, dropping it", addr);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });

        debug!("Published {:?} to {} link(s)", raw, links.len());
    }
}
