//! Protocol commands

use std::fmt;

use crate::error::{Error, Result};
use crate::template::Template;

/// Packets sent to the meter
///
/// Each command renders to a [`Template`] string, so every packet on the
/// wire goes through the same expansion and checksum path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/?!` CR LF
    Identify,

    /// ACK `0` speed `1` CR LF
    SelectSpeed(u8),

    /// SOH `P1` STX `(password)` ETX BCC
    Password(String),

    /// SOH `R1` STX `address(args)` ETX BCC
    ReadRegister {
        address: String,
        args: Vec<String>,
    },

    /// SOH `B0` ETX BCC
    Disconnect,
}

impl Command {
    /// Template text for this command
    pub fn template(&self) -> String {
        match self {
            Self::Identify => "/?![CR][LF]".to_string(),
            Self::SelectSpeed(speed) => format!("[ACK]0{}1[CR][LF]", speed),
            Self::Password(password) => format!("[SOH]P1[STX]({})[ETX][BCC]", password),
            Self::ReadRegister { address, args } => {
                format!("[SOH]R1[STX]{}({})[ETX][BCC]", address, args.join(","))
            }
            Self::Disconnect => "[SOH]B0[ETX][BCC]".to_string(),
        }
    }

    /// Parse the rendered template
    ///
    /// Fails when user-supplied parts (password, address, arguments) contain
    /// brackets, parentheses or anything but printable ASCII. Arguments may
    /// not contain `,` either.
    pub fn to_template(&self) -> Result<Template> {
        match self {
            Self::SelectSpeed(speed) if crate::baud_rate(*speed).is_none() => {
                return Err(Error::UnsupportedSpeed(*speed));
            }
            Self::Password(password) => check_field("password", password, &[])?,
            Self::ReadRegister { address, args } => {
                check_field("address", address, &[])?;
                for arg in args {
                    check_field("argument", arg, &[','])?;
                }
            }
            _ => {}
        }
        Template::parse(&self.template())
    }

    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identify => "IDENTIFY",
            Self::SelectSpeed(_) => "SELECT_SPEED",
            Self::Password(_) => "P1",
            Self::ReadRegister { .. } => "R1",
            Self::Disconnect => "B0",
        }
    }
}

fn check_field(field: &'static str, value: &str, extra: &[char]) -> Result<()> {
    let forbidden = value.chars().find(|c| {
        !c.is_ascii_graphic() || matches!(*c, '[' | ']' | '(' | ')') || extra.contains(c)
    });

    match forbidden {
        Some(found) => Err(Error::InvalidField {
            field,
            value: value.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectSpeed(speed) => write!(f, "{}({})", self.name(), speed),
            Self::ReadRegister { address, .. } => write!(f, "{}({})", self.name(), address),
            _ => f.write_str(self.name()),
        }
    }
}
