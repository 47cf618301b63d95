//! # neva-core
//!
//! Core protocol implementation for NEVA electricity meters.
//!
//! This crate provides the low-level protocol primitives:
//! - Control bytes and ASCII conversion
//! - Block check character (BCC) calculation
//! - Command templates and their expansion into packets
//! - Session state and authentication retry policy
//! - Response value extraction and number coercion

pub mod auth;
pub mod checksum;
pub mod codec;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod parser;
pub mod session;
pub mod template;
pub mod value;

pub use auth::RetryPolicy;
pub use command::Command;
pub use error::{Error, Result};
pub use packet::Response;
pub use session::{Session, SessionState};
pub use template::Template;
pub use value::Value;

/// Baud rates indexed by the speed digit announced by the meter
pub const BAUD_RATES: [u32; 6] = [300, 600, 1200, 2400, 4800, 9600];

/// Baud rate for a speed digit, if the digit is in the table
///
/// # Examples
///
/// ```
/// assert_eq!(neva_core::baud_rate(5), Some(9600));
/// assert_eq!(neva_core::baud_rate(6), None);
/// ```
pub fn baud_rate(speed: u8) -> Option<u32> {
    BAUD_RATES.get(speed as usize).copied()
}
