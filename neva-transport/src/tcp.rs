//! TCP transport for serial-to-Ethernet bridges
//!
//! The bridge is expected to be transparent: bytes written to the socket go
//! straight out of the serial port at whatever line settings the bridge is
//! configured with. Baud rate changes are recorded but cannot be signalled.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, io, LinkSettings, Transport};

/// TCP transport for a transparent serial bridge
pub struct TcpTransport {
    addr: String,
    socket_addr: Option<SocketAddr>,
    stream: Option<BufReader<TcpStream>>,
    connect_timeout: Duration,
    settings: LinkSettings,
}

impl TcpTransport {
    /// Create new TCP transport for `host:port`
    pub fn new(addr: impl Into<String>, settings: LinkSettings) -> Self {
        Self {
            addr: addr.into(),
            socket_addr: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
            settings,
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&self.addr)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.addr, e)))?
            .collect();

        let addr = addrs
            .first()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", self.addr)))?;

        self.socket_addr = Some(*addr);
        Ok(*addr)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Packets are a few bytes long; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(32)]);

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_until(&mut self, terminator: u8) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        io::read_until(stream, terminator, self.settings.timeout).await
    }

    async fn read_up_to(&mut self, len: usize) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        io::read_up_to(stream, len, self.settings.timeout).await
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        debug!(
            "Baud rate {} -> {} on {} (not signalled to the bridge)",
            self.settings.baud_rate,
            baud_rate,
            self.remote_addr()
        );
        self.settings.baud_rate = baud_rate;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.settings.baud_rate
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| self.addr.clone())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("TCP transport dropped while still connected");
        }
    }
}
