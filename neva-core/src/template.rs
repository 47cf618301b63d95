//! Command templates
//!
//! A template is ASCII text with bracketed placeholders:
//!
//! ```text
//! [SOH]R1[STX]VOLT()[ETX][BCC]
//! ```
//!
//! `[SOH]`, `[STX]`, `[ETX]`, `[EOT]`, `[ACK]`, `[NAK]`, `[LF]` and `[CR]`
//! become the corresponding control byte. `[BCC]` emits nothing in place and
//! requests that the block check character of everything else be appended as
//! the final byte. Any other bracketed name is rejected.

use bytes::{BufMut, BytesMut};

use crate::{
    checksum, codec,
    constants::CHECKSUM_SENTINEL,
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Control(u8),
}

/// Parsed command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    append_checksum: bool,
}

impl Template {
    /// Parse a template
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTemplate`] if:
    /// - a placeholder names neither a control byte nor `BCC`
    /// - a `[` is never closed, or a `]` is never opened
    /// - the text is not ASCII
    pub fn parse(template: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedTemplate {
            template: template.to_string(),
            reason,
        };

        if !template.is_ascii() {
            return Err(malformed("non-ASCII text".into()));
        }

        let mut segments = Vec::new();
        let mut append_checksum = false;
        let mut rest = template;

        while !rest.is_empty() {
            let open = rest.find('[');
            let close = rest.find(']');

            match (open, close) {
                (None, None) => {
                    segments.push(Segment::Literal(rest.to_string()));
                    break;
                }
                (Some(open), Some(close)) if open < close => {
                    if open > 0 {
                        segments.push(Segment::Literal(rest[..open].to_string()));
                    }

                    let name = &rest[open + 1..close];
                    if name == CHECKSUM_SENTINEL {
                        append_checksum = true;
                    } else if let Some(byte) = codec::control_byte(name) {
                        segments.push(Segment::Control(byte));
                    } else {
                        return Err(malformed(format!("unknown placeholder [{}]", name)));
                    }

                    rest = &rest[close + 1..];
                }
                (Some(open), None) => {
                    let at = template.len() - rest.len() + open;
                    return Err(malformed(format!("unterminated placeholder at {}", at)));
                }
                (_, Some(close)) => {
                    let at = template.len() - rest.len() + close;
                    return Err(malformed(format!("unmatched ']' at {}", at)));
                }
            }
        }

        Ok(Self {
            segments,
            append_checksum,
        })
    }

    /// Whether the expanded packet ends with a block check character
    pub fn appends_checksum(&self) -> bool {
        self.append_checksum
    }

    /// Expand into wire bytes
    pub fn expand(&self) -> BytesMut {
        let mut buf = BytesMut::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => buf.put_slice(text.as_bytes()),
                Segment::Control(byte) => buf.put_u8(*byte),
            }
        }

        if self.append_checksum {
            let bcc = checksum::calculate(&buf);
            buf.put_u8(bcc);
        }

        buf
    }
}

/// Parse and expand a template in one step
///
/// # Examples
///
/// ```
/// use neva_core::template;
///
/// let packet = template::expand("[SOH]B0[ETX][BCC]").unwrap();
/// assert_eq!(packet.as_ref(), b"\x01B0\x03\x71");
/// ```
pub fn expand(template: &str) -> Result<BytesMut> {
    Ok(Template::parse(template)?.expand())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ACK, CR, ETX, LF, SOH, STX};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_identification() {
        let packet = expand("/?![CR][LF]").unwrap();
        assert_eq!(packet.as_ref(), &[b'/', b'?', b'!', CR, LF]);
    }

    #[test]
    fn test_expand_speed_selection() {
        let packet = expand("[ACK]051[CR][LF]").unwrap();
        assert_eq!(packet.as_ref(), &[ACK, b'0', b'5', b'1', CR, LF]);
    }

    #[test]
    fn test_expand_password_appends_checksum_last() {
        let packet = expand("[SOH]P1[STX](00000000)[ETX][BCC]").unwrap();
        let (body, bcc) = packet.split_at(packet.len() - 1);

        assert_eq!(body[0], SOH);
        assert_eq!(body[3], STX);
        assert_eq!(&body[4..14], b"(00000000)");
        assert_eq!(body[14], ETX);
        assert_eq!(bcc[0], checksum::calculate(body));
    }

    #[test]
    fn test_sentinel_position_does_not_matter() {
        let early = expand("[BCC][SOH]B0[ETX]").unwrap();
        let late = expand("[SOH]B0[ETX][BCC]").unwrap();
        assert_eq!(early, late);
    }

    #[test]
    fn test_expand_is_deterministic() {
        let template = "[SOH]R1[STX]0A0B(1,2)[ETX][BCC]";
        assert_eq!(expand(template).unwrap(), expand(template).unwrap());
    }

    #[test]
    fn test_without_sentinel_no_checksum() {
        let template = Template::parse("[SOH]B0[ETX]").unwrap();
        assert!(!template.appends_checksum());
        assert_eq!(template.expand().as_ref(), b"\x01B0\x03");
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let result = Template::parse("[SOH]R1[XYZ]");
        match result {
            Err(Error::MalformedTemplate { reason, .. }) => assert!(reason.contains("[XYZ]")),
            other => panic!("Expected MalformedTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_lowercase_name_is_rejected() {
        assert!(Template::parse("[soh]").is_err());
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(Template::parse("[SOH]R1[STX").is_err());
        assert!(Template::parse("R1]").is_err());
        assert!(Template::parse("R1][STX]").is_err());
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        assert!(Template::parse("[SOH]R1[STX]Ω[ETX]").is_err());
    }

    #[test]
    fn test_empty_template() {
        assert!(expand("").unwrap().is_empty());
    }
}
