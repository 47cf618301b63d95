//! Protocol constants

use std::time::Duration;

/// Start of header
pub const SOH: u8 = 0x01;

/// Start of text
pub const STX: u8 = 0x02;

/// End of text
pub const ETX: u8 = 0x03;

/// End of transmission
pub const EOT: u8 = 0x04;

/// Acknowledge
pub const ACK: u8 = 0x06;

/// Negative acknowledge
pub const NAK: u8 = 0x15;

/// Line feed
pub const LF: u8 = b'\n';

/// Carriage return
pub const CR: u8 = b'\r';

/// Template placeholder meaning "append the block check character here"
pub const CHECKSUM_SENTINEL: &str = "BCC";

/// Wait after a speed change before the meter listens at the new rate
pub const BAUD_SETTLE: Duration = Duration::from_millis(300);

/// Wait after the disconnect packet before the link is closed
pub const CLOSE_DRAIN: Duration = Duration::from_millis(50);

/// Password sent when none is configured
pub const DEFAULT_PASSWORD: &str = "00000000";

/// Authentication retry parameters
pub mod auth {
    use std::time::Duration;

    /// Retries after the first attempt
    pub const MAX_RETRIES: u32 = 3;

    /// Delay before the first retry
    pub const BACKOFF_BASE: Duration = Duration::from_millis(500);

    /// Added to the delay for every further retry
    pub const BACKOFF_STEP: Duration = Duration::from_millis(100);
}
