//! Control byte names and ASCII conversion

use bytes::Bytes;

use crate::constants::{ACK, CR, EOT, ETX, LF, NAK, SOH, STX};
use crate::error::{Error, Result};

/// Control bytes that may be named in a template
pub const CONTROL_BYTES: [(&str, u8); 8] = [
    ("SOH", SOH),
    ("STX", STX),
    ("ETX", ETX),
    ("EOT", EOT),
    ("ACK", ACK),
    ("NAK", NAK),
    ("LF", LF),
    ("CR", CR),
];

/// Look up a control byte by name
///
/// # Examples
///
/// ```
/// use neva_core::codec;
///
/// assert_eq!(codec::control_byte("ETX"), Some(0x03));
/// assert_eq!(codec::control_byte("BCC"), None);
/// ```
pub fn control_byte(name: &str) -> Option<u8> {
    CONTROL_BYTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, b)| *b)
}

pub fn is_control(name: &str) -> bool {
    control_byte(name).is_some()
}

/// Name of a control byte, for diagnostics
pub fn control_name(byte: u8) -> Option<&'static str> {
    CONTROL_BYTES
        .iter()
        .find(|(_, b)| *b == byte)
        .map(|(n, _)| *n)
}

/// Encode ASCII text for the wire
pub fn to_bytes(text: &str) -> Result<Bytes> {
    if !text.is_ascii() {
        return Err(Error::NotAscii(text.to_string()));
    }
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

/// Decode received bytes as text
///
/// Meters answer in 7-bit ASCII; anything else is replaced rather than
/// rejected so a noisy line still yields a readable dump.
pub fn to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Render bytes for logs: hex followed by the text with control bytes named
pub fn dump(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for &b in bytes {
        match control_name(b) {
            Some(name) => {
                text.push('[');
                text.push_str(name);
                text.push(']');
            }
            None if b.is_ascii_graphic() || b == b' ' => text.push(b as char),
            None => text.push('.'),
        }
    }
    format!("{}: {}", hex::encode(bytes), text)
}
