//! The engine's typed-variable vocabulary and the coercion rules between
//! control strings and typed JSON values.

use crate::error::FormError;
use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Submission rendition of a date — the naive shape extended with millis
/// and a UTC offset, e.g. `2013-01-23T14:42:45.000+0100`.
pub const DATE_FORMAT_WITH_ZONE: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    String,
    Integer,
    Long,
    Short,
    Float,
    Double,
    Boolean,
    Date,
    Bytes,
    File,
    Xml,
    Json,
    Object,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "String",
            VariableType::Integer => "Integer",
            VariableType::Long => "Long",
            VariableType::Short => "Short",
            VariableType::Float => "Float",
            VariableType::Double => "Double",
            VariableType::Boolean => "Boolean",
            VariableType::Date => "Date",
            VariableType::Bytes => "Bytes",
            VariableType::File => "File",
            VariableType::Xml => "Xml",
            VariableType::Json => "Json",
            VariableType::Object => "Object",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            VariableType::Integer | VariableType::Long | VariableType::Short
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = FormError;

    /// Accepts the engine spelling, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(VariableType::String),
            "integer" => Ok(VariableType::Integer),
            "long" => Ok(VariableType::Long),
            "short" => Ok(VariableType::Short),
            "float" => Ok(VariableType::Float),
            "double" => Ok(VariableType::Double),
            "boolean" => Ok(VariableType::Boolean),
            "date" => Ok(VariableType::Date),
            "bytes" => Ok(VariableType::Bytes),
            "file" => Ok(VariableType::File),
            "xml" => Ok(VariableType::Xml),
            "json" => Ok(VariableType::Json),
            "object" => Ok(VariableType::Object),
            other => Err(FormError::UnknownType(other.to_owned())),
        }
    }
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("integer pattern"))
}

fn float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?([eE][-+]?\d+)?$").expect("float pattern"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").expect("date pattern")
    })
}

/// Whether `raw` passes the declared type's validation.
pub fn is_type(raw: &str, ty: VariableType) -> bool {
    coerce(raw, ty).is_ok()
}

/// Coerce a control string to a typed JSON value.
///
/// The empty string means "no value" and coerces to null for every
/// non-String type; a non-empty value failing validation is an error —
/// never a silently degraded value.
pub fn coerce(raw: &str, ty: VariableType) -> Result<Value, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() && ty != VariableType::String {
        return Ok(Value::Null);
    }

    let reject = || FormError::Coerce {
        value: raw.to_owned(),
        expected: ty,
    };

    match ty {
        VariableType::String => Ok(Value::String(raw.to_owned())),

        VariableType::Integer => {
            if !integer_re().is_match(trimmed) {
                return Err(reject());
            }
            let n: i32 = trimmed.parse().map_err(|_| reject())?;
            Ok(Value::from(n))
        }
        VariableType::Short => {
            if !integer_re().is_match(trimmed) {
                return Err(reject());
            }
            let n: i16 = trimmed.parse().map_err(|_| reject())?;
            Ok(Value::from(n))
        }
        VariableType::Long => {
            if !integer_re().is_match(trimmed) {
                return Err(reject());
            }
            let n: i64 = trimmed.parse().map_err(|_| reject())?;
            Ok(Value::from(n))
        }

        VariableType::Float | VariableType::Double => {
            if !float_re().is_match(trimmed) {
                return Err(reject());
            }
            let n: f64 = trimmed.parse().map_err(|_| reject())?;
            Ok(Value::from(n))
        }

        VariableType::Boolean => match trimmed {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(reject()),
        },

        VariableType::Date => {
            if !date_re().is_match(trimmed) {
                return Err(reject());
            }
            NaiveDateTime::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| reject())?;
            Ok(Value::String(trimmed.to_owned()))
        }

        VariableType::Xml => {
            if !xml_is_well_formed(trimmed) {
                return Err(reject());
            }
            Ok(Value::String(raw.to_owned()))
        }

        VariableType::Json => serde_json::from_str(trimmed).map_err(|_| reject()),

        // opaque to the control layer; passed through as-is
        VariableType::Bytes | VariableType::File | VariableType::Object => {
            Ok(Value::String(raw.to_owned()))
        }
    }
}

fn xml_is_well_formed(raw: &str) -> bool {
    let mut reader = quick_xml::Reader::from_str(raw);
    reader.config_mut().check_end_names = true;
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Eof) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

/// Render a typed value the way a text control shows it.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // composite values (Json variables) render as their serialization
        other => other.to_string(),
    }
}

/// Format a date for submission: reattach millis and the given UTC offset
/// to a naive `YYYY-MM-DDTHH:mm:ss` (or already-zoned ISO) value.
pub fn date_with_timezone(raw: &str, offset: FixedOffset) -> Result<String, FormError> {
    let reject = || FormError::Coerce {
        value: raw.to_owned(),
        expected: VariableType::Date,
    };

    if let Ok(zoned) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(zoned.format(DATE_FORMAT_WITH_ZONE).to_string());
    }

    let naive = NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| reject())?;
    let zoned = offset.from_local_datetime(&naive).single().ok_or_else(reject)?;
    Ok(zoned.format(DATE_FORMAT_WITH_ZONE).to_string())
}

/// Loose equality between a typed value and another value that may still be
/// a string rendition of it (control defaults are always strings).
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), other) | (other, Value::String(s)) => match other {
            Value::Number(n) => s.parse::<f64>().map_or(false, |parsed| {
                n.as_f64().map_or(false, |n| (n - parsed).abs() < f64::EPSILON)
            }),
            Value::Bool(v) => s == if *v { "true" } else { "false" },
            Value::String(o) => s == o,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── integral types ───────────────────────────────────────────

    #[test]
    fn integer_accepts_whole_numbers_only() {
        assert_eq!(coerce("100", VariableType::Integer).unwrap(), json!(100));
        assert_eq!(coerce("-42", VariableType::Integer).unwrap(), json!(-42));
        assert!(coerce("100.1", VariableType::Integer).is_err());
        assert!(coerce("abc", VariableType::Integer).is_err());
    }

    #[test]
    fn integral_types_respect_their_width() {
        assert!(coerce("40000", VariableType::Short).is_err());
        assert_eq!(coerce("40000", VariableType::Integer).unwrap(), json!(40000));
        assert!(coerce("3000000000", VariableType::Integer).is_err());
        assert_eq!(
            coerce("3000000000", VariableType::Long).unwrap(),
            json!(3_000_000_000i64)
        );
    }

    #[test]
    fn empty_string_is_null_for_non_string_types() {
        for ty in [
            VariableType::Integer,
            VariableType::Float,
            VariableType::Boolean,
            VariableType::Date,
            VariableType::Json,
        ] {
            assert_eq!(coerce("", ty).unwrap(), Value::Null, "{ty}");
        }
        assert_eq!(coerce("", VariableType::String).unwrap(), json!(""));
    }

    // ── floats, booleans ─────────────────────────────────────────

    #[test]
    fn float_accepts_decimals_and_exponents() {
        assert_eq!(coerce("100.1", VariableType::Float).unwrap(), json!(100.1));
        assert_eq!(coerce("-2.5e3", VariableType::Double).unwrap(), json!(-2500.0));
        assert!(coerce("not a number", VariableType::Float).is_err());
    }

    #[test]
    fn boolean_accepts_exact_literals_only() {
        assert_eq!(coerce("true", VariableType::Boolean).unwrap(), json!(true));
        assert_eq!(coerce("false", VariableType::Boolean).unwrap(), json!(false));
        assert!(coerce("TRUE", VariableType::Boolean).is_err());
        assert!(coerce("yes", VariableType::Boolean).is_err());
    }

    // ── dates ────────────────────────────────────────────────────

    #[test]
    fn date_requires_the_engine_shape() {
        assert_eq!(
            coerce("2013-01-23T13:42:42", VariableType::Date).unwrap(),
            json!("2013-01-23T13:42:42")
        );
        assert!(coerce("2013-01-23", VariableType::Date).is_err());
        assert!(coerce("23.01.2013 13:42", VariableType::Date).is_err());
        // calendar-invalid even though the shape matches
        assert!(coerce("2013-02-30T00:00:00", VariableType::Date).is_err());
    }

    #[test]
    fn date_with_timezone_attaches_offset_and_millis() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            date_with_timezone("2013-01-23T14:42:45", offset).unwrap(),
            "2013-01-23T14:42:45.000+0100"
        );
    }

    #[test]
    fn date_with_timezone_keeps_an_existing_offset() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            date_with_timezone("2013-01-23T14:42:45-05:00", offset).unwrap(),
            "2013-01-23T14:42:45.000-0500"
        );
    }

    // ── xml / json ───────────────────────────────────────────────

    #[test]
    fn xml_requires_well_formed_markup() {
        assert!(coerce("<order><item/></order>", VariableType::Xml).is_ok());
        assert!(coerce("<order><item></order>", VariableType::Xml).is_err());
    }

    #[test]
    fn json_deserializes() {
        assert_eq!(
            coerce(r#"{"a": [1, 2]}"#, VariableType::Json).unwrap(),
            json!({"a": [1, 2]})
        );
        assert!(coerce("{broken", VariableType::Json).is_err());
    }

    // ── type names, rendering, loose equality ────────────────────

    #[test]
    fn parses_engine_spelling() {
        assert_eq!("Integer".parse::<VariableType>().unwrap(), VariableType::Integer);
        assert_eq!("json".parse::<VariableType>().unwrap(), VariableType::Json);
        assert!("Money".parse::<VariableType>().is_err());
    }

    #[test]
    fn render_matches_control_expectations() {
        assert_eq!(render(&Value::Null), "");
        assert_eq!(render(&json!(100)), "100");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&json!("x")), "x");
        assert_eq!(render(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn loose_equality_crosses_string_boundaries() {
        assert!(loosely_equal(&json!(100), &json!("100")));
        assert!(loosely_equal(&json!(true), &json!("true")));
        assert!(loosely_equal(&json!("x"), &json!("x")));
        assert!(!loosely_equal(&json!(100), &json!("101")));
        assert!(!loosely_equal(&Value::Null, &json!("")));
    }
}
