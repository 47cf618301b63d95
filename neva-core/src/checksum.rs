//! Block check character (BCC)
//!
//! 1. Skip the first byte if it is SOH or STX
//! 2. XOR every remaining byte, including the terminating ETX
//! 3. Send the result as one trailing byte

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::constants::{SOH, STX};

/// Calculate the block check character of a packet
///
/// # Examples
///
/// ```
/// use neva_core::checksum;
///
/// // SOH is skipped, 'B' ^ '0' ^ ETX
/// assert_eq!(checksum::calculate(b"\x01B0\x03"), 0x71);
/// ```
pub fn calculate(packet: &[u8]) -> u8 {
    let body = match packet.first() {
        Some(&SOH) | Some(&STX) => &packet[1..],
        _ => packet,
    };

    let bcc = body.iter().fold(0u8, |acc, b| acc ^ b);

    trace!(
        packet_len = packet.len(),
        bcc = format!("0x{:02X}", bcc),
        "Calculated checksum"
    );

    bcc
}

/// Copy `packet` and append its block check character
pub fn append(packet: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(packet.len() + 1);
    buf.put_slice(packet);
    buf.put_u8(calculate(packet));
    buf
}

/// Verify a received block check character
pub fn verify(payload: &[u8], received: u8) -> bool {
    calculate(payload) == received
}
