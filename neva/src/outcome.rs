//! Results that carry non-fatal diagnostics

use std::fmt;

/// Non-fatal condition observed while producing a value
///
/// Every advisory is also logged at `warn` level when it is raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Block check character did not match the frame
    ChecksumMismatch {
        expected: u8,
        received: Option<u8>,
    },

    /// No address table registered for the identified model
    UnknownModel(String),

    /// Meter did not echo the requested address
    UnsupportedRegister(String),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch { expected, received: Some(received) } => write!(
                f,
                "Block checksum mismatch: expected 0x{:02X}, received 0x{:02X}",
                expected, received
            ),
            Self::ChecksumMismatch { expected, received: None } => write!(
                f,
                "Block checksum missing: expected 0x{:02X}",
                expected
            ),
            Self::UnknownModel(model) => write!(f, "Unknown meter model [{}]", model),
            Self::UnsupportedRegister(address) => write!(f, "Command not supported [{}]", address),
        }
    }
}

/// Value plus the advisories raised while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            advisories: Vec::new(),
        }
    }

    pub fn with_advisories(value: T, advisories: Vec<Advisory>) -> Self {
        Self { value, advisories }
    }

    /// `true` when nothing was degraded
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Drop the advisories
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            advisories: self.advisories,
        }
    }
}
