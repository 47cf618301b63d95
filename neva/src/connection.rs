//! Packet exchange over a transport

use tokio::time::sleep;
use tracing::{debug, warn};

use neva_core::constants::{ACK, BAUD_SETTLE, CLOSE_DRAIN, ETX};
use neva_core::{codec, template, Command, Response};
use neva_transport::Transport;

use crate::error::Result;

/// Exchanges packets with the meter
///
/// Every packet written or frame read bumps a sequence number that is
/// attached to the debug log of that exchange.
pub struct Connection {
    transport: Box<dyn Transport>,
    sequence: u64,
}

impl Connection {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            sequence: 0,
        }
    }

    /// Check if the link is open
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Number of packets written plus frames read so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn baud_rate(&self) -> u32 {
        self.transport.baud_rate()
    }

    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    /// Open the link if it is not open yet
    pub async fn open(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            self.transport.open().await?;
        }
        Ok(())
    }

    /// Expand `template` and send it
    pub async fn write(&mut self, template: &str) -> Result<()> {
        let packet = template::expand(template)?;
        self.send(&packet).await
    }

    /// Render `command` and send it
    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        let packet = command.to_template()?.expand();
        debug!(command = %command, "Sending command");
        self.send(&packet).await
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.sequence += 1;
        debug!(seq = self.sequence, ">> {}", codec::dump(packet));
        self.transport.send(packet).await?;
        Ok(())
    }

    /// Read up to `terminator`, then the check byte if `check_checksum`
    ///
    /// A bad or missing check byte is logged and reported through
    /// [`Response::is_valid`]; the payload is returned either way.
    pub async fn read_until(&mut self, terminator: u8, check_checksum: bool) -> Result<Response> {
        let payload = self.transport.read_until(terminator).await?.freeze();

        self.sequence += 1;
        debug!(seq = self.sequence, "<< {}", codec::dump(&payload));

        if !check_checksum {
            return Ok(Response::unchecked(payload));
        }

        let received = self.transport.read_up_to(1).await?.first().copied();
        let response = Response::checked(payload, received);

        if !response.is_valid() {
            warn!(
                seq = self.sequence,
                expected = format!("0x{:02X}", response.expected_checksum()),
                received = ?received.map(|c| format!("0x{:02X}", c)),
                "Block checksum mismatch"
            );
        }

        Ok(response)
    }

    /// Read an ETX-terminated frame and its check byte
    pub async fn read(&mut self) -> Result<Response> {
        self.read_until(ETX, true).await
    }

    /// Read a single byte and report whether it is ACK
    pub async fn read_ack(&mut self) -> Result<bool> {
        let reply = self.transport.read_up_to(1).await?;

        self.sequence += 1;
        debug!(seq = self.sequence, "<< {}", codec::dump(&reply));

        Ok(reply.first() == Some(&ACK))
    }

    /// Ask the meter to switch speed, then follow it
    ///
    /// Only the local side is switched here. The caller has to read a frame
    /// at the new rate before assuming the meter followed.
    pub async fn negotiate_baud(&mut self, speed: u8) -> Result<u32> {
        let baud_rate =
            neva_core::baud_rate(speed).ok_or(neva_core::Error::UnsupportedSpeed(speed))?;

        self.write_command(&Command::SelectSpeed(speed)).await?;
        sleep(BAUD_SETTLE).await;
        self.transport.set_baud_rate(baud_rate).await?;

        debug!(speed, baud_rate, "Switched baud rate");
        Ok(baud_rate)
    }

    /// Send the disconnect packet and close the link
    ///
    /// Does nothing if the link is not open.
    pub async fn close(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            return Ok(());
        }

        if let Err(e) = self.write_command(&Command::Disconnect).await {
            warn!("Failed to send disconnect packet: {}", e);
        }

        sleep(CLOSE_DRAIN).await;

        if let Err(e) = self.transport.flush().await {
            warn!("Failed to flush link: {}", e);
        }

        self.transport.close().await?;
        Ok(())
    }
}
