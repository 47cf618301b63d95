//! Serial port transport (optical probe or RS-485 adapter)

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace, warn};

use crate::{error::*, io, LinkSettings, Transport};

/// Local serial port
pub struct SerialTransport {
    path: String,
    settings: LinkSettings,
    stream: Option<BufReader<SerialStream>>,
}

impl SerialTransport {
    /// Create serial transport for a device path (e.g. `/dev/ttyUSB0`, `COM3`)
    pub fn new(path: impl Into<String>, settings: LinkSettings) -> Self {
        Self {
            path: path.into(),
            settings,
            stream: None,
        }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyConnected);
        }

        debug!(
            "Opening {} at {} baud ({:?}, {:?}, {:?})",
            self.path,
            self.settings.baud_rate,
            self.settings.data_bits,
            self.settings.parity,
            self.settings.stop_bits
        );

        let stream = tokio_serial::new(&self.path, self.settings.baud_rate)
            .data_bits(self.settings.data_bits.into())
            .parity(self.settings.parity.into())
            .stop_bits(self.settings.stop_bits.into())
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(self.settings.timeout)
            .open_native_async()?;

        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}", self.path);
            let _ = stream.flush().await;
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
        if let Some(stream) = self.stream.as_mut() {
            stream.get_mut().set_baud_rate(baud_rate)?;
        }
        debug!("{}: baud rate {} -> {}", self.path, self.settings.baud_rate, baud_rate);
        self.settings.baud_rate = baud_rate;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.settings.baud_rate
    }

    fn remote_addr(&self) -> String {
        self.path.clone()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Serial transport dropped while still open");
        }
    }
}
