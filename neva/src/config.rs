//! Meter configuration

use std::time::Duration;

use neva_core::constants::DEFAULT_PASSWORD;
use neva_transport::{DataBits, LinkSettings, Parity, StopBits};

use crate::error::{Error, Result};

/// Everything needed to open and authenticate a meter session
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use neva::MeterConfig;
///
/// let config = MeterConfig::new("socket://10.0.0.5:5000")
///     .with_timeout(Duration::from_secs(5))
///     .with_raw_fields(["date", "time", "serial"]);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterConfig {
    /// Serial device path or `socket://host:port`
    pub url: String,

    /// Line settings for the transport
    pub link: LinkSettings,

    /// Password sent in the `P1` packet
    pub password: String,

    /// Aliases whose values are returned as text (lowercase)
    pub raw_fields: Vec<String>,
}

impl MeterConfig {
    /// Config with default line settings, password and raw fields
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            link: LinkSettings::default(),
            password: DEFAULT_PASSWORD.to_string(),
            raw_fields: vec!["date".to_string(), "time".to_string()],
        }
    }

    /// Set read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.link.timeout = timeout;
        self
    }

    /// Set initial baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.link.baud_rate = baud_rate;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.link.parity = parity;
        self
    }

    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.link.data_bits = data_bits;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.link.stop_bits = stop_bits;
        self
    }

    /// Set password (default: `00000000`)
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Replace the raw field list
    pub fn with_raw_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.raw_fields = fields
            .into_iter()
            .map(|f| f.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Whether values read through `alias` stay text
    pub fn is_raw(&self, alias: &str) -> bool {
        self.raw_fields.iter().any(|f| f.eq_ignore_ascii_case(alias))
    }

    /// Check the configuration once, before any I/O
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig("url must not be empty".into()));
        }

        if self.link.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be greater than zero".into()));
        }

        if !neva_core::BAUD_RATES.contains(&self.link.baud_rate) {
            return Err(Error::InvalidConfig(format!(
                "baud rate {} not in {:?}",
                self.link.baud_rate,
                neva_core::BAUD_RATES
            )));
        }

        if self.password.is_empty()
            || !self
                .password
                .chars()
                .all(|c| c.is_ascii_graphic() && !matches!(c, '[' | ']' | '(' | ')'))
        {
            return Err(Error::InvalidConfig(
                "password must be printable ASCII without brackets or parentheses".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeterConfig::new("/dev/ttyUSB0");

        assert_eq!(config.password, "00000000");
        assert_eq!(config.link, LinkSettings::default());
        assert!(config.is_raw("date"));
        assert!(config.is_raw("TIME"));
        assert!(!config.is_raw("voltage"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_raw_fields_are_lowercased() {
        let config = MeterConfig::new("/dev/ttyUSB0").with_raw_fields(["Serial"]);
        assert_eq!(config.raw_fields, vec!["serial"]);
        assert!(!config.is_raw("date"));
    }

    #[test]
    fn test_validate_rejects() {
        let base = MeterConfig::new("/dev/ttyUSB0");

        assert!(MeterConfig::new("  ").validate().is_err());
        assert!(base.clone().with_timeout(Duration::ZERO).validate().is_err());
        assert!(base.clone().with_baud_rate(115200).validate().is_err());
        assert!(base.clone().with_password("").validate().is_err());
        assert!(base.clone().with_password("12)[ETX]").validate().is_err());
        assert!(base.with_baud_rate(9600).validate().is_ok());
    }
}
