//! Meter identification

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// `/<vendor:3><speed:1><model>.<version>`, searched anywhere in the reply
static IDENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/([^/\r\n]{3})(\d)([^\r\n]+)\.([^.\r\n]*)")
        .expect("identification pattern is valid")
});

/// Highest speed digit the meter may announce (index into the baud table)
pub const MAX_SPEED_DIGIT: u8 = 5;

/// Meter identity, as announced in the identification reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterInfo {
    /// Three-letter manufacturer code
    pub vendor: String,

    /// Highest supported speed, as an index into the baud table
    pub speed: u8,

    /// Model identifier (e.g. `MT174`), used to select the address table
    pub model: String,

    /// Firmware version
    pub version: String,
}

impl MeterInfo {
    /// Parse an identification reply such as `/TPC5MT174.03\r\n`
    ///
    /// # Examples
    ///
    /// ```
    /// use neva_types::MeterInfo;
    ///
    /// let info = MeterInfo::parse("/ABC5MT174.03\n").unwrap();
    /// assert_eq!(info.vendor, "ABC");
    /// assert_eq!(info.speed, 5);
    /// assert_eq!(info.model, "MT174");
    /// assert_eq!(info.version, "03");
    /// ```
    pub fn parse(reply: &str) -> Result<Self> {
        let caps = IDENT_PATTERN
            .captures(reply)
            .ok_or_else(|| Error::Parse(format!("unrecognised identification reply {:?}", reply)))?;

        let speed = caps[2]
            .parse::<u8>()
            .map_err(|e| Error::Parse(format!("speed digit {:?}: {}", &caps[2], e)))?;

        if speed > MAX_SPEED_DIGIT {
            return Err(Error::Validation(format!(
                "speed digit {} outside supported range 0..={}",
                speed, MAX_SPEED_DIGIT
            )));
        }

        Ok(Self {
            vendor: caps[1].to_string(),
            speed,
            model: caps[3].to_string(),
            version: caps[4].to_string(),
        })
    }
}

impl fmt::Display for MeterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} v{}", self.vendor, self.model, self.version)
    }
}
