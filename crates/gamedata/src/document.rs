//! Structured document access.
//!
//! Documents are `serde_json::Value` trees built with `preserve_order`, so
//! object members iterate in the order they were written.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub type Members = Map<String, Value>;

pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let content = fs::read_to_string(&path)?;
    parse_document(&content)
}

pub fn parse_document(text: &str) -> Result<Value> {
    let document = serde_json::from_str(text)?;
    Ok(document)
}

/// Parse a signed integer, honouring a `0x`/`0X` hex prefix.
///
/// At most one leading sign is accepted, and the value must fit in an `i64`.
///
/// ```
/// use gamedata::read_offset;
///
/// assert_eq!(read_offset("0x10").unwrap(), 16);
/// assert_eq!(read_offset("-0x10").unwrap(), -16);
/// assert_eq!(read_offset("16").unwrap(), 16);
/// assert!(read_offset("--16").is_err());
/// ```
pub fn read_offset(text: &str) -> Result<i64> {
    let invalid = |message: String| Error::InvalidValue {
        entry: text.to_string(),
        message,
    };

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };

    // from_str_radix takes its own sign; only bare digits may reach it.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid(format!("not an integer: \"{}\"", trimmed)));
    }

    let magnitude = u64::from_str_radix(digits, radix)
        .map_err(|e| invalid(format!("not an integer: {}", e)))?;

    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or_else(|| invalid(format!("\"{}\" is out of range", trimmed)))
}

/// Read a document number as a signed offset.
///
/// Non-negative numbers are taken as `u64` and reinterpreted, so values above
/// `i64::MAX` wrap the same way a pointer-sized cast would.
pub fn number_as_offset(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    number
        .as_u64()
        .map(|unsigned| unsigned as i64)
        .or_else(|| number.as_i64())
}

/// Resolve an offset-like value: numbers directly, strings via [`read_offset`].
pub fn value_as_offset(entry: &str, value: &Value) -> Result<i64> {
    match value {
        Value::String(text) => read_offset(text).map_err(|e| match e {
            Error::InvalidValue { message, .. } => Error::InvalidValue {
                entry: entry.to_string(),
                message,
            },
            other => other,
        }),
        Value::Number(_) => number_as_offset(value).ok_or_else(|| Error::InvalidValue {
            entry: entry.to_string(),
            message: format!("expected an integer, got {}", value),
        }),
        other => Err(Error::InvalidValue {
            entry: entry.to_string(),
            message: format!("expected a number or numeric string, got {}", kind_of(other)),
        }),
    }
}

/// Human-readable name of a value's shape, for diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn expect_object<'a>(entry: &str, value: &'a Value) -> Result<&'a Members> {
    value.as_object().ok_or_else(|| Error::InvalidValue {
        entry: entry.to_string(),
        message: format!("expected an object, got {}", kind_of(value)),
    })
}

pub(crate) fn member_str<'a>(entry: &str, members: &'a Members, key: &str) -> Result<&'a str> {
    let value = members.get(key).ok_or_else(|| Error::MissingKey {
        key: key.to_string(),
        entry: entry.to_string(),
    })?;

    value.as_str().ok_or_else(|| Error::InvalidValue {
        entry: entry.to_string(),
        message: format!("\"{}\" must be a string, got {}", key, kind_of(value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_offset_hex_and_decimal() {
        assert_eq!(read_offset("0x10").unwrap(), 16);
        assert_eq!(read_offset("0X1f").unwrap(), 31);
        assert_eq!(read_offset("16").unwrap(), 16);
        assert_eq!(read_offset(" 42 ").unwrap(), 42);
        assert_eq!(read_offset("-8").unwrap(), -8);
        assert_eq!(read_offset("+0x8").unwrap(), 8);
    }

    #[test]
    fn test_read_offset_invalid() {
        assert!(read_offset("").is_err());
        assert!(read_offset("0x").is_err());
        assert!(read_offset("twelve").is_err());
        assert!(read_offset("0xZZ").is_err());
        assert!(read_offset("- 5").is_err());
    }

    #[test]
    fn test_read_offset_rejects_repeated_sign() {
        for text in ["++5", "-+5", "+-5", "--5", "0x+5", "-0x-5"] {
            assert!(
                matches!(read_offset(text), Err(Error::InvalidValue { .. })),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_read_offset_range() {
        assert_eq!(read_offset("0x7FFFFFFFFFFFFFFF").unwrap(), i64::MAX);
        assert_eq!(read_offset("-0x8000000000000000").unwrap(), i64::MIN);
        assert_eq!(read_offset("-9223372036854775808").unwrap(), i64::MIN);

        let err = read_offset("0x8000000000000000").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);
        assert!(read_offset("-0x8000000000000001").is_err());
        assert!(read_offset("0xFFFFFFFFFFFFFFFF").is_err());
        assert!(read_offset("18446744073709551616").is_err());
    }

    #[test]
    fn test_value_as_offset() {
        assert_eq!(value_as_offset("a", &json!("0x10")).unwrap(), 16);
        assert_eq!(value_as_offset("a", &json!(16)).unwrap(), 16);
        assert_eq!(value_as_offset("a", &json!(-4)).unwrap(), -4);
        assert_eq!(value_as_offset("a", &json!(u64::MAX)).unwrap(), -1);
        assert!(value_as_offset("a", &json!(1.5)).is_err());

        let err = value_as_offset("m_iHealth", &json!(true)).unwrap_err();
        assert!(err.to_string().contains("m_iHealth"));
    }

    #[test]
    fn test_document_preserves_member_order() {
        let document = parse_document(r#"{"read": 0, "offset": 4, "win64": {}, "another": 1}"#)
            .unwrap();
        let names: Vec<&str> = document
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["read", "offset", "win64", "another"]);
    }

    #[test]
    fn test_load_document_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"csgo": {{"Offsets": {{}}}}}}"#).unwrap();

        let document = load_document(file.path()).unwrap();
        assert!(document.get("csgo").is_some());
    }

    #[test]
    fn test_load_document_missing_file() {
        let err = load_document("/nonexistent/gamedata.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_member_str() {
        let value = json!({"library": "server", "count": 3});
        let members = value.as_object().unwrap();
        assert_eq!(member_str("Foo", members, "library").unwrap(), "server");
        assert!(matches!(
            member_str("Foo", members, "name"),
            Err(Error::MissingKey { .. })
        ));
        assert!(matches!(
            member_str("Foo", members, "count"),
            Err(Error::InvalidValue { .. })
        ));
    }
}
