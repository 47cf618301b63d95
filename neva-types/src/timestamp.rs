//! Meter clock registers
//!
//! Date and time registers are returned as raw `YYMMDD` and `HHMMSS` text.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// Combine raw date and time register text into a timestamp
///
/// # Examples
///
/// ```
/// use neva_types::timestamp;
///
/// let ts = timestamp::parse("230919", "143005").unwrap();
/// assert_eq!(ts.to_string(), "2023-09-19 14:30:05");
/// ```
pub fn parse(date: &str, time: &str) -> Result<NaiveDateTime> {
    let combined = format!("{}{}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&combined, "%y%m%d%H%M%S")
        .map_err(|e| Error::Parse(format!("meter clock {:?}: {}", combined, e)))
}
