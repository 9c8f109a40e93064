//! Raw and normalized metadata values.
//!
//! # Responsibility
//! - Decode stored raw strings into comparable values.
//! - Encode normalized values back into raw strings for storage.
//!
//! # Invariants
//! - Structured values are JSON arrays or objects.
//! - `MetaValue::decode(&value.encode()) == value` for text and containers.
//! - A malformed structured encoding decodes to opaque text, never an error.

use log::warn;
use serde_json::Value;

/// One decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Opaque scalar stored as-is.
    Text(String),
    /// Decoded JSON array or object.
    Structured(Value),
}

enum RawShape {
    Structured(Value),
    Malformed(serde_json::Error),
    /// Text that had to be stored as a JSON string literal.
    Escaped(String),
    Plain,
}

impl MetaValue {
    /// Decodes a raw stored value, falling back to text on malformed input.
    pub fn decode(raw: &str) -> Self {
        match classify(raw) {
            RawShape::Structured(value) => Self::Structured(value),
            RawShape::Escaped(text) => Self::Text(text),
            RawShape::Plain => Self::Text(raw.to_string()),
            RawShape::Malformed(err) => {
                warn!(
                    "event=meta_decode module=model status=fallback raw_len={} error={}",
                    raw.len(),
                    err
                );
                Self::Text(raw.to_string())
            }
        }
    }

    /// Encodes this value into its raw storage form.
    pub fn encode(&self) -> String {
        match self {
            Self::Structured(value) => value.to_string(),
            Self::Text(text) if needs_escape(text) => Value::String(text.clone()).to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Wraps an opaque scalar.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Scalar text, `None` for structured values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Structured(_) => None,
        }
    }

    /// Returns whether this value decoded to a JSON container.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

impl From<Value> for MetaValue {
    /// JSON scalars become text so every `Structured` value is a container.
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Null => Self::Text(String::new()),
            container @ (Value::Array(_) | Value::Object(_)) => Self::Structured(container),
            scalar => Self::Text(scalar.to_string()),
        }
    }
}

/// Normalized value of one snapshot key.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    /// Key held exactly one stored value.
    Single(MetaValue),
    /// Key held zero or several stored values, in storage order.
    Sequence(Vec<MetaValue>),
}

impl SnapshotValue {
    /// Normalizes the stored value set of one key.
    pub fn from_raw_values(raw_values: &[String]) -> Self {
        match raw_values {
            [only] => Self::Single(MetaValue::decode(only)),
            many => Self::Sequence(many.iter().map(|raw| MetaValue::decode(raw)).collect()),
        }
    }

    /// Raw values to store for this key, one entry per stored row.
    pub fn encoded_values(&self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value.encode()],
            Self::Sequence(values) => values.iter().map(MetaValue::encode).collect(),
        }
    }

    /// Returns whether the key held anything other than exactly one value.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }
}

impl From<MetaValue> for SnapshotValue {
    fn from(value: MetaValue) -> Self {
        Self::Single(value)
    }
}

fn classify(raw: &str) -> RawShape {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => RawShape::Structured(value),
            Err(err) => RawShape::Malformed(err),
        };
    }

    if raw.starts_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(raw) {
            if needs_escape(&inner) {
                return RawShape::Escaped(inner);
            }
        }
    }

    RawShape::Plain
}

/// True when storing `text` verbatim would not decode back to the same text.
fn needs_escape(text: &str) -> bool {
    matches!(
        classify(text),
        RawShape::Structured(_) | RawShape::Escaped(_)
    )
}

#[cfg(test)]
mod tests {
    use super::{MetaValue, SnapshotValue};
    use serde_json::json;

    #[test]
    fn decode_recognizes_arrays_and_objects() {
        assert_eq!(
            MetaValue::decode(r#"["a","b"]"#),
            MetaValue::Structured(json!(["a", "b"]))
        );
        assert_eq!(
            MetaValue::decode(r#"{"w":1}"#),
            MetaValue::Structured(json!({"w": 1}))
        );
    }

    #[test]
    fn decode_keeps_scalars_as_text() {
        assert_eq!(MetaValue::decode("123"), MetaValue::text("123"));
        assert_eq!(MetaValue::decode("true"), MetaValue::text("true"));
        assert_eq!(MetaValue::decode(r#""quoted""#), MetaValue::text(r#""quoted""#));
        assert_eq!(MetaValue::decode(""), MetaValue::text(""));
    }

    #[test]
    fn decode_falls_back_to_text_for_malformed_structures() {
        assert_eq!(MetaValue::decode("[broken"), MetaValue::text("[broken"));
        assert_eq!(MetaValue::decode("{oops}"), MetaValue::text("{oops}"));
    }

    #[test]
    fn text_that_looks_structured_round_trips() {
        for text in [r#"["not","a list"]"#, " {\"a\":1}", r#""[1]""#, r#""\"[1]\"""#] {
            let value = MetaValue::text(text);
            let encoded = value.encode();
            assert_eq!(MetaValue::decode(&encoded), value, "raw `{text}`");
        }
    }

    #[test]
    fn plain_text_is_stored_verbatim() {
        assert_eq!(MetaValue::text("draft v1").encode(), "draft v1");
        assert_eq!(MetaValue::text("[broken").encode(), "[broken");
    }

    #[test]
    fn json_scalars_convert_to_text() {
        assert_eq!(MetaValue::from(json!(5)), MetaValue::text("5"));
        assert_eq!(MetaValue::from(json!("x")), MetaValue::text("x"));
        assert!(MetaValue::from(json!([1])).is_structured());
        assert_eq!(MetaValue::from(json!(5)).as_text(), Some("5"));
        assert_eq!(MetaValue::from(json!([1])).as_text(), None);
    }

    #[test]
    fn floats_survive_reencoding() {
        for raw in ["[1.0715660391465826e-75]", "[0.1,2.5e300,-3.0e-310]", r#"{"ratio":0.30000000000000004}"#] {
            let value = MetaValue::decode(raw);
            assert!(value.is_structured(), "raw `{raw}`");
            assert_eq!(MetaValue::decode(&value.encode()), value, "raw `{raw}`");
        }
    }

    #[test]
    fn object_keys_keep_stored_order() {
        let raw = r#"{"zeta":"first","alpha":"second"}"#;
        assert_eq!(MetaValue::decode(raw).encode(), raw);
    }

    #[test]
    fn single_raw_value_unwraps_to_scalar() {
        let value = SnapshotValue::from_raw_values(&["ok".to_string()]);
        assert_eq!(value, SnapshotValue::Single(MetaValue::text("ok")));
        assert!(!value.is_sequence());
    }

    #[test]
    fn multiple_raw_values_stay_an_ordered_sequence() {
        let value = SnapshotValue::from_raw_values(&["b".to_string(), "a".to_string()]);
        assert_eq!(
            value,
            SnapshotValue::Sequence(vec![MetaValue::text("b"), MetaValue::text("a")])
        );
        assert!(value.is_sequence());
        assert_eq!(value.encoded_values(), vec!["b", "a"]);
    }
}
