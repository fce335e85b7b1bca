//! Body encodings selectable per call.
//!
//! # Design
//! The web API speaks JSON by default and the Python literal form for a few
//! actions. Each encoding is a `Codec`; `Format` is the closed set of choices
//! a call can make and resolves to its codec. The transport never sees
//! either: `WebApi` encodes before building the request and decodes after
//! the status check.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::pyliteral;

/// Text encoding for structured data.
pub trait Codec {
    fn encode(&self, value: &Value) -> Result<String, String>;
    fn decode(&self, text: &str) -> Result<Value, String>;
}

/// `serde_json` with `", "` / `": "` separators, matching the spacing the
/// server's own JSON encoder writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// Python literal text via [`pyliteral`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, String> {
        let mut out = String::new();
        write_spaced_json(&mut out, value).map_err(|e| e.to_string())?;
        Ok(out)
    }

    fn decode(&self, text: &str) -> Result<Value, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

impl Codec for PythonCodec {
    fn encode(&self, value: &Value) -> Result<String, String> {
        Ok(pyliteral::to_string(value))
    }

    fn decode(&self, text: &str) -> Result<Value, String> {
        pyliteral::from_str(text).map_err(|e| e.to_string())
    }
}

fn write_spaced_json(out: &mut String, value: &Value) -> serde_json::Result<()> {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_spaced_json(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push_str(": ");
                write_spaced_json(out, item)?;
            }
            out.push('}');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// Wire format selector for request bodies and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Python,
}

impl Format {
    /// Value sent in the `request_format` / `output_format` query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Python => "python",
        }
    }

    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Format::Json => &JsonCodec,
            Format::Python => &PythonCodec,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "python" => Ok(Format::Python),
            other => Err(format!("unknown format '{other}', expected 'json' or 'python'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_encoding_uses_spaced_separators() {
        let text = Format::Json.codec().encode(&json!({"x": 1, "y": ["a", true]})).unwrap();
        assert_eq!(text, r#"{"x": 1, "y": ["a", true]}"#);
    }

    #[test]
    fn json_strings_are_escaped() {
        let text = Format::Json.codec().encode(&json!({"k": "a\"b"})).unwrap();
        assert_eq!(text, r#"{"k": "a\"b"}"#);
    }

    #[test]
    fn python_encoding_uses_literal_form() {
        let text = Format::Python.codec().encode(&json!({"x": null})).unwrap();
        assert_eq!(text, "{'x': None}");
    }

    #[test]
    fn decode_errors_are_reported() {
        assert!(Format::Json.codec().decode("{'x': 1}").is_err());
        assert_eq!(Format::Python.codec().decode("{'x': 1}").unwrap(), json!({"x": 1}));
    }

    #[test]
    fn wire_names_parse_back() {
        for format in [Format::Json, Format::Python] {
            assert_eq!(format.as_str().parse::<Format>().unwrap(), format);
        }
        assert!("xml".parse::<Format>().is_err());
    }
}
