//! Transport layer for NEVA meters
//!
//! Provides the byte channel the protocol runs over: a local serial port or a
//! transparent serial-to-TCP bridge.

pub mod error;
pub mod io;
pub mod serial;
pub mod settings;
pub mod tcp;

pub use error::{Error, Result};
pub use serial::SerialTransport;
pub use settings::{DataBits, LinkSettings, Parity, StopBits, DEFAULT_READ_TIMEOUT};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::BytesMut;

/// Half-duplex byte channel to a meter
///
/// Reads never fail on timeout: they return the bytes received before the
/// link's read timeout expired, possibly none.
#[async_trait]
pub trait Transport: Send {
    /// Open the channel
    async fn open(&mut self) -> Result<()>;

    /// Close the channel
    async fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Flush pending output
    async fn flush(&mut self) -> Result<()>;

    /// Receive up to and including `terminator`
    async fn read_until(&mut self, terminator: u8) -> Result<BytesMut>;

    /// Receive at most `len` bytes
    async fn read_up_to(&mut self, len: usize) -> Result<BytesMut>;

    /// Switch line speed
    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;

    /// Current line speed
    fn baud_rate(&self) -> u32;

    /// Get remote address (device path or `host:port`)
    fn remote_addr(&self) -> String;
}

/// Build a transport from a URL
///
/// - `socket://host:port` or `tcp://host:port`: transparent TCP bridge
/// - anything without a scheme: serial device path
///
/// The transport is returned unopened.
///
/// # Examples
///
/// ```
/// use neva_transport::{open_url, LinkSettings};
///
/// let transport = open_url("socket://10.0.0.5:5000", LinkSettings::default()).unwrap();
/// assert_eq!(transport.remote_addr(), "10.0.0.5:5000");
/// assert!(open_url("rfc2217://10.0.0.5:5000", LinkSettings::default()).is_err());
/// ```
pub fn open_url(url: &str, settings: LinkSettings) -> Result<Box<dyn Transport>> {
    match url.split_once("://") {
        Some(("socket" | "tcp", addr)) => {
            if addr.is_empty() {
                return Err(Error::InvalidAddress(url.to_string()));
            }
            Ok(Box::new(TcpTransport::new(addr, settings)))
        }
        Some((scheme, _)) => Err(Error::UnsupportedScheme(scheme.to_string())),
        None if url.is_empty() => Err(Error::InvalidAddress(url.to_string())),
        None => Ok(Box::new(SerialTransport::new(url, settings))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_url_dispatch() {
        let tcp = open_url("tcp://127.0.0.1:5000", LinkSettings::default()).unwrap();
        assert_eq!(tcp.remote_addr(), "127.0.0.1:5000");

        let serial = open_url("/dev/ttyUSB0", LinkSettings::default()).unwrap();
        assert_eq!(serial.remote_addr(), "/dev/ttyUSB0");
        assert!(!serial.is_open());
    }

    #[test]
    fn test_open_url_rejects() {
        assert!(matches!(
            open_url("rfc2217://host:1", LinkSettings::default()),
            Err(Error::UnsupportedScheme(s)) if s == "rfc2217"
        ));
        assert!(matches!(
            open_url("socket://", LinkSettings::default()),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            open_url("", LinkSettings::default()),
            Err(Error::InvalidAddress(_))
        ));
    }
}
