//! URL-form encoding of nested key/value structures.
//!
//! The polling backend expects `application/x-www-form-urlencoded`
//! bodies with PHP-style bracket nesting:
//!
//! ```text
//! {channels: {c1: ["e1", "e2"]}}
//!   → channels%5Bc1%5D%5B0%5D=e1&channels%5Bc1%5D%5B1%5D=e2
//! ```
//!
//! An empty nested container encodes as `key=` (an empty string value)
//! rather than being dropped — the backend relies on the key being
//! present.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

// ============================================================================
// FormValue
// ============================================================================

/// A value in a URL-form encoded request body.
///
/// Maps are `BTreeMap`s so that encoded output is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// A scalar, encoded verbatim.
    Text(String),

    /// An ordered list, encoded with `key[0]`, `key[1]`, ... subscripts.
    List(Vec<FormValue>),

    /// A nested map, encoded with `key[sub]` subscripts.
    Map(FormMap),
}

/// The root (and nested-map) shape of a form body.
pub type FormMap = BTreeMap<String, FormValue>;

impl FormValue {
    /// Creates a scalar value.
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Converts arbitrary JSON into a form value.
    ///
    /// Scalars stringify the way a JS client coerces them; objects and
    /// arrays become nested containers.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Text(String::new()),
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Number(n) => Self::Text(n.to_string()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a form body into an `application/x-www-form-urlencoded`
/// string with bracket nesting.
#[must_use]
pub fn url_encode_object(body: &FormMap) -> String {
    let mut pairs = Vec::new();
    for (key, value) in body {
        encode_value(key, value, &mut pairs);
    }

    pairs.join("&")
}

fn encode_value(key: &str, value: &FormValue, pairs: &mut Vec<String>) {
    match value {
        FormValue::Text(text) => pairs.push(pair(key, text)),

        FormValue::Map(map) if map.is_empty() => pairs.push(pair(key, "")),
        FormValue::Map(map) => {
            for (sub, value) in map {
                encode_value(&format!("{key}[{sub}]"), value, pairs);
            }
        }

        FormValue::List(items) if items.is_empty() => pairs.push(pair(key, "")),
        FormValue::List(items) => {
            for (index, value) in items.iter().enumerate() {
                encode_value(&format!("{key}[{index}]"), value, pairs);
            }
        }
    }
}

#[inline]
fn pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    fn map(entries: Vec<(&str, FormValue)>) -> FormMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_scalar_pairs() {
        let body = map(vec![
            ("channel_name", FormValue::text("room")),
            ("event", FormValue::text("msg")),
        ]);

        assert_eq!(url_encode_object(&body), "channel_name=room&event=msg");
    }

    #[test]
    fn test_nested_channel_map() {
        let body = map(vec![(
            "channels",
            FormValue::Map(map(vec![(
                "c1",
                FormValue::List(vec![FormValue::text("e1"), FormValue::text("e2")]),
            )])),
        )]);

        assert_eq!(
            url_encode_object(&body),
            "channels%5Bc1%5D%5B0%5D=e1&channels%5Bc1%5D%5B1%5D=e2"
        );
    }

    #[test]
    fn test_empty_nested_map_keeps_key() {
        let body = map(vec![("channels", FormValue::Map(FormMap::new()))]);
        assert_eq!(url_encode_object(&body), "channels=");
    }

    #[test]
    fn test_empty_list_keeps_key() {
        let body = map(vec![("channels", FormValue::List(Vec::new()))]);
        assert_eq!(url_encode_object(&body), "channels=");
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let body = map(vec![("q", FormValue::text("a b&c=d"))]);
        assert_eq!(url_encode_object(&body), "q=a%20b%26c%3Dd");
    }

    #[test]
    fn test_from_json() {
        let value = json!({
            "channel_name": "room",
            "data": { "text": "hi", "count": 2, "flag": true },
        });

        let FormValue::Map(body) = FormValue::from_json(&value) else {
            panic!("expected map");
        };

        assert_eq!(
            url_encode_object(&body),
            "channel_name=room&data%5Bcount%5D=2&data%5Bflag%5D=true&data%5Btext%5D=hi"
        );
    }

    proptest! {
        // Encoding is total and deterministic for arbitrary scalar bodies.
        #[test]
        fn test_encode_never_panics(entries in proptest::collection::btree_map(".*", ".*", 0..8)) {
            let body: FormMap = entries
                .into_iter()
                .map(|(k, v)| (k, FormValue::Text(v)))
                .collect();

            let first = url_encode_object(&body);
            let second = url_encode_object(&body);
            prop_assert_eq!(first, second);
        }
    }
}
