//! Received frames

use bytes::Bytes;
use std::fmt;

use crate::{checksum, codec};

/// Frame read from the meter
///
/// # Frame Structure
///
/// ```text
/// ┌───────────┬───────────┬─────────────┬───────┬──────────┐
/// │ [SOH]     │ [STX]     │   Payload   │  ETX  │   BCC    │
/// │ optional  │ optional  │  (ASCII)    │       │ optional │
/// └───────────┴───────────┴─────────────┴───────┴──────────┘
/// ```
///
/// `payload` holds everything up to and including the terminator. The check
/// byte is kept separately and validated on demand; a bad check byte never
/// hides the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    /// Bytes up to and including the terminator
    pub payload: Bytes,

    /// Trailing block check character, if one was requested and received
    pub checksum: Option<u8>,

    /// Whether a check byte was requested for this frame
    pub checked: bool,
}

impl Response {
    /// Frame read without a check byte
    pub fn unchecked(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            checksum: None,
            checked: false,
        }
    }

    /// Frame read with a check byte (`None` when the link timed out first)
    pub fn checked(payload: impl Into<Bytes>, checksum: Option<u8>) -> Self {
        Self {
            payload: payload.into(),
            checksum,
            checked: true,
        }
    }

    /// Checksum calculated over the payload
    pub fn expected_checksum(&self) -> u8 {
        checksum::calculate(&self.payload)
    }

    /// `true` when no check byte was requested, or it matches the payload
    pub fn is_valid(&self) -> bool {
        if !self.checked {
            return true;
        }
        self.checksum
            .is_some_and(|received| checksum::verify(&self.payload, received))
    }

    /// Payload decoded as text
    pub fn text(&self) -> String {
        codec::to_text(&self.payload)
    }

    /// `true` when the link returned nothing before timing out
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the payload ends with `terminator`
    pub fn is_terminated_by(&self, terminator: u8) -> bool {
        self.payload.last() == Some(&terminator)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("payload", &codec::dump(&self.payload))
            .field("checksum", &self.checksum.map(|c| format!("0x{:02X}", c)))
            .field("expected", &format!("0x{:02X}", self.expected_checksum()))
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response(len={}, valid={})", self.payload.len(), self.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ETX, LF};

    #[test]
    fn test_checked_valid() {
        let payload = b"\x02VOLT(230.5)\x03".to_vec();
        let bcc = checksum::calculate(&payload);
        let response = Response::checked(payload, Some(bcc));

        assert!(response.is_valid());
        assert!(response.is_terminated_by(ETX));
        assert_eq!(response.text(), "\x02VOLT(230.5)\x03");
    }

    #[test]
    fn test_checked_mismatch_keeps_payload() {
        let response = Response::checked(&b"\x02VOLT(230.5)\x03"[..], Some(0x00));

        assert!(!response.is_valid());
        assert_eq!(response.payload.as_ref(), b"\x02VOLT(230.5)\x03");
    }

    #[test]
    fn test_checked_missing_byte_is_invalid() {
        let response = Response::checked(&b"\x02\x03"[..], None);
        assert!(!response.is_valid());
    }

    #[test]
    fn test_unchecked_is_always_valid() {
        let response = Response::unchecked(&b"/ABC5MT174.03\n"[..]);
        assert!(response.is_valid());
        assert!(response.is_terminated_by(LF));
    }

    #[test]
    fn test_empty() {
        assert!(Response::unchecked(Bytes::new()).is_empty());
    }
}
