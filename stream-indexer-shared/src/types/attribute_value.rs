//! Typed-attribute values as they appear in change stream images.
//!
//! Every value in a stream image is wrapped in a single-key object naming its
//! type, e.g. `{"S": "hello"}`, `{"N": "42"}` or `{"M": {...}}`. This module
//! turns such wrappers into plain JSON values.

use serde_json::{Map, Number, Value};

/// A single typed attribute.
///
/// `Raw` holds values whose type tag is not recognized (sets, binary, null and
/// anything added to the stream format later). They are passed through as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(String),
    Bool(bool),
    Map(Vec<(String, AttributeValue)>),
    List(Vec<AttributeValue>),
    Raw(Value),
}

impl AttributeValue {
    /// Parse a one-key type wrapper.
    ///
    /// A value that is not a single-key object is kept as `Raw` unchanged.
    pub fn parse(wrapped: &Value) -> Self {
        let Some(object) = wrapped.as_object() else {
            return Self::Raw(wrapped.clone());
        };
        let mut entries = object.iter();
        let (Some((tag, inner)), None) = (entries.next(), entries.next()) else {
            return Self::Raw(wrapped.clone());
        };

        match tag.as_str() {
            "S" => Self::String(match inner {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            "N" => Self::Number(match inner {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            "BOOL" => Self::Bool(truthy(inner)),
            "M" => Self::Map(match inner {
                Value::Object(fields) => fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::parse(v)))
                    .collect(),
                _ => Vec::new(),
            }),
            "L" => Self::List(match inner {
                Value::Array(items) => items.iter().map(Self::parse).collect(),
                _ => Vec::new(),
            }),
            _ => Self::Raw(inner.clone()),
        }
    }

    /// Convert into a plain JSON value, recursing through maps and lists.
    pub fn into_plain(self) -> Value {
        match self {
            Self::String(s) => Value::String(s),
            Self::Number(text) => parse_number(&text).unwrap_or(Value::String(text)),
            Self::Bool(b) => Value::Bool(b),
            Self::Map(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, v.into_plain()))
                    .collect(),
            ),
            Self::List(items) => Value::Array(items.into_iter().map(Self::into_plain).collect()),
            Self::Raw(value) => value,
        }
    }
}

/// Decode a single wrapped value into its plain form.
pub fn decode_value(wrapped: &Value) -> Value {
    AttributeValue::parse(wrapped).into_plain()
}

/// Decode a whole typed-attribute image into a plain mapping.
///
/// Field order of the image is preserved.
pub fn decode_image(image: &Map<String, Value>) -> Map<String, Value> {
    image
        .iter()
        .map(|(name, wrapped)| (name.clone(), decode_value(wrapped)))
        .collect()
}

/// Numbers travel as text. Integral values stay integers so that ids and
/// millisecond timestamps keep full precision.
fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Some(Value::Number(u.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decode_scalars() {
        let decoded = decode_image(&image(json!({
            "title": {"S": "Steakhouse"},
            "count": {"N": "42"},
            "ratio": {"N": "0.5"},
            "isArchived": {"BOOL": false}
        })));

        assert_eq!(decoded["title"], json!("Steakhouse"));
        assert_eq!(decoded["count"], json!(42));
        assert_eq!(decoded["ratio"], json!(0.5));
        assert_eq!(decoded["isArchived"], json!(false));
    }

    #[test]
    fn test_decode_nested_map_and_list() {
        let decoded = decode_image(&image(json!({
            "meta": {"M": {
                "author": {"S": "ana"},
                "scores": {"L": [{"N": "1"}, {"N": "2"}]}
            }},
            "tags": {"L": [{"S": "food"}, {"M": {"k": {"BOOL": true}}}]}
        })));

        assert_eq!(
            decoded["meta"],
            json!({"author": "ana", "scores": [1, 2]})
        );
        assert_eq!(decoded["tags"], json!(["food", {"k": true}]));
    }

    #[test]
    fn test_unknown_tag_passes_inner_value_through() {
        let decoded = decode_image(&image(json!({
            "labels": {"SS": ["a", "b"]},
            "nothing": {"NULL": true}
        })));

        assert_eq!(decoded["labels"], json!(["a", "b"]));
        assert_eq!(decoded["nothing"], json!(true));
    }

    #[test]
    fn test_malformed_input_is_inert() {
        assert_eq!(decode_value(&json!("bare")), json!("bare"));
        assert_eq!(
            decode_value(&json!({"S": "a", "N": "1"})),
            json!({"S": "a", "N": "1"})
        );
        assert_eq!(decode_value(&json!({"N": "not-a-number"})), json!("not-a-number"));
        assert_eq!(decode_value(&json!({"M": "oops"})), json!({}));
    }

    #[test]
    fn test_large_integers_keep_precision() {
        assert_eq!(
            decode_value(&json!({"N": "1718000000123"})),
            json!(1718000000123_i64)
        );
    }

    #[test]
    fn test_decode_is_repeatable() {
        let source = image(json!({
            "pk": {"S": "user1"},
            "nested": {"M": {"l": {"L": [{"N": "3"}, {"S": "x"}]}}}
        }));

        assert_eq!(decode_image(&source), decode_image(&source));
    }

    #[test]
    fn test_field_order_preserved() {
        let decoded = decode_image(&image(json!({
            "z": {"S": "1"},
            "a": {"S": "2"}
        })));
        let keys: Vec<&String> = decoded.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
