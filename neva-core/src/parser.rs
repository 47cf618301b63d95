//! Response parsing
//!
//! A register reply looks like `<address>(<field>[,<field>...])`. The text
//! inside the parentheses is split on commas and each field is coerced to a
//! number, unless the register is flagged raw.

use regex::Regex;
use tracing::trace;

use crate::value::Value;

/// Comma-split register text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    Single(String),
    Multiple(Vec<String>),
}

/// Text between the echoed `address(` and the last `)`
///
/// Returns `None` when the meter did not echo the address, which is how it
/// answers registers it does not support.
///
/// # Examples
///
/// ```
/// use neva_core::parser;
///
/// let text = "\x02VOLT(230.5)\x03";
/// assert_eq!(parser::extract(text, "VOLT").as_deref(), Some("230.5"));
/// assert_eq!(parser::extract("\x02OTHER(5)\x03", "VOLT"), None);
/// ```
pub fn extract(response: &str, address: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"{}\((.*)\)", regex::escape(address))).ok()?;
    let value = pattern.captures(response)?.get(1)?.as_str().to_string();

    trace!(address, value = value.as_str(), "Extracted register value");
    Some(value)
}

/// Split on commas when present
pub fn sanitize(text: &str) -> Fields {
    if text.contains(',') {
        Fields::Multiple(text.split(',').map(str::to_string).collect())
    } else {
        Fields::Single(text.to_string())
    }
}

/// Coerce fields to a value
///
/// Raw fields are returned as text, multi-field raw text re-joined with
/// commas. Otherwise every field is coerced on its own, in order.
pub fn coerce(fields: Fields, raw: bool) -> Value {
    match (fields, raw) {
        (Fields::Single(text), true) => Value::Text(text),
        (Fields::Multiple(parts), true) => Value::Text(parts.join(",")),
        (Fields::Single(text), false) => coerce_field(&text),
        (Fields::Multiple(parts), false) => {
            Value::List(parts.iter().map(|p| coerce_field(p)).collect())
        }
    }
}

/// `sanitize` followed by `coerce`
pub fn parse_value(text: &str, raw: bool) -> Value {
    coerce(sanitize(text), raw)
}

/// Integer when there is no `.`, float otherwise; text when not a number
fn coerce_field(field: &str) -> Value {
    let trimmed = field.trim();

    if trimmed.contains('.') {
        return trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Text(field.to_string()));
    }

    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Integer(n);
    }

    // Exponent notation such as `1e3` still counts as an integer.
    // Anything outside the i64 range stays text.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

    match trimmed.parse::<f64>() {
        Ok(n) if (-LIMIT..LIMIT).contains(&n) => Value::Integer(n.trunc() as i64),
        _ => Value::Text(field.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(parse_value("1", false), Value::Integer(1));
        assert_eq!(parse_value("0042", false), Value::Integer(42));
        assert_eq!(parse_value("-7", false), Value::Integer(-7));
        assert_eq!(parse_value("1e3", false), Value::Integer(1000));
    }

    #[test]
    fn test_integer_beyond_i64_stays_text() {
        assert_eq!(
            parse_value("9223372036854775807", false),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            parse_value("99999999999999999999", false),
            Value::Text("99999999999999999999".into())
        );
        assert_eq!(parse_value("1e19", false), Value::Text("1e19".into()));
        assert_eq!(parse_value("-1e30", false), Value::Text("-1e30".into()));
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(parse_value("1.50", false), Value::Float(1.5));
        assert_eq!(parse_value("230.5", false), Value::Float(230.5));
        assert_eq!(parse_value(".5", false), Value::Float(0.5));
    }

    #[test]
    fn test_coerce_list_keeps_order() {
        assert_eq!(
            parse_value("03,1.20,0", false),
            Value::List(vec![Value::Integer(3), Value::Float(1.2), Value::Integer(0)])
        );
    }

    #[test]
    fn test_raw_is_unchanged() {
        assert_eq!(parse_value("230919", true), Value::Text("230919".into()));
        assert_eq!(parse_value("01,02", true), Value::Text("01,02".into()));
    }

    #[test]
    fn test_non_numeric_stays_text() {
        assert_eq!(parse_value("ERR", false), Value::Text("ERR".into()));
        assert_eq!(parse_value("", false), Value::Text("".into()));
        assert_eq!(
            parse_value("1,x", false),
            Value::List(vec![Value::Integer(1), Value::Text("x".into())])
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("12"), Fields::Single("12".into()));
        assert_eq!(
            sanitize("1,2"),
            Fields::Multiple(vec!["1".into(), "2".into()])
        );
    }

    #[test]
    fn test_extract_greedy_to_last_paren() {
        let text = "\x020A0B(12.5,(3))\x03";
        assert_eq!(extract(text, "0A0B").as_deref(), Some("12.5,(3)"));
    }

    #[test]
    fn test_extract_escapes_address() {
        assert_eq!(extract("\x02A.B(1)\x03", "A.B").as_deref(), Some("1"));
        assert_eq!(extract("\x02AxB(1)\x03", "A.B"), None);
    }

    #[test]
    fn test_extract_empty_value() {
        assert_eq!(extract("\x02VOLT()\x03", "VOLT").as_deref(), Some(""));
    }
}
