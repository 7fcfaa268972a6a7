//! Query-string encoding for serializable structures.
//!
//! # Design
//! A query structure is any `serde::Serialize` value that serializes to a map.
//! Field names (or their `#[serde(rename)]`) become keys, `#[serde(skip)]`
//! fields and `None` values are omitted. The value is bridged through
//! `serde_json::Value` and then flattened into a [`QueryValues`] multimap:
//! scalars become one value, sequences one value per element, and nested
//! structures produce `parent[child]` keys.
//!
//! [`QueryValues`] keeps its keys in a `BTreeMap`, so encoding always emits
//! keys in lexicographic order regardless of insertion order.
//!
//! Encoding escapes `*` and leaves `~` bare, so the output matches the
//! usual `url.Values` form instead of the WHATWG form serializer. Parsing is
//! strict: a `;` separator or a `%` not followed by two hex digits is an
//! error rather than a literal.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// Errors produced while turning a structure into query values.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("serializing query structure failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("query structure must serialize to a map, got {0}")]
    NotAStruct(&'static str),

    #[error("unsupported {kind} value for query key {key:?}")]
    Unsupported { key: String, kind: &'static str },

    #[error("invalid semicolon separator in query {0:?}")]
    Semicolon(String),

    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
}

/// Sorted multimap of query keys to their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues(BTreeMap<String, Vec<String>>);

impl QueryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `a=1&b=2` query string.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        for pair in query.split('&') {
            if pair.contains(';') {
                return Err(QueryError::Semicolon(pair.to_owned()));
            }
            if let Some(escape) = invalid_escape(pair) {
                return Err(QueryError::InvalidEscape(escape.to_owned()));
            }
        }
        let mut values = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values.add(key, value);
        }
        Ok(values)
    }

    /// Append `value` to the values already stored under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append every value of `other`, keeping values already present.
    pub fn merge(&mut self, other: QueryValues) {
        for (key, values) in other.0 {
            self.0.entry(key).or_default().extend(values);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Form-urlencode the values, keys sorted, e.g. `a=1&b=x+y`.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.iter() {
            if !out.is_empty() {
                out.push('&');
            }
            escape_into(&mut out, key);
            out.push('=');
            escape_into(&mut out, value);
        }
        out
    }
}

fn escape_into(out: &mut String, raw: &str) {
    for chunk in form_urlencoded::byte_serialize(raw.as_bytes()) {
        if chunk == "%7E" {
            out.push('~');
        } else {
            out.push_str(&chunk.replace('*', "%2A"));
        }
    }
}

/// First `%` sequence in `raw` that is not followed by two hex digits.
pub(crate) fn invalid_escape(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        if b != b'%' {
            return None;
        }
        let valid = bytes.len() > i + 2 && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit();
        if valid {
            None
        } else {
            let end = (i + 3).min(raw.len());
            Some(raw.get(i..end).unwrap_or(&raw[i..]))
        }
    })
}

/// A value that can be encoded as query parameters.
///
/// Implemented for every `Serialize + Send + Sync` type, so deriving
/// `Serialize` is all a structure needs.
pub trait QueryEncodable: Send + Sync {
    fn encode_query(&self) -> Result<QueryValues, QueryError>;
}

impl<T: Serialize + Send + Sync> QueryEncodable for T {
    fn encode_query(&self) -> Result<QueryValues, QueryError> {
        to_query_values(self)
    }
}

/// Flatten a serializable structure into query values.
pub fn to_query_values<T: Serialize + ?Sized>(value: &T) -> Result<QueryValues, QueryError> {
    let mut values = QueryValues::new();
    match serde_json::to_value(value)? {
        Value::Null => {}
        Value::Object(fields) => {
            for (key, field) in &fields {
                flatten(&mut values, key, field)?;
            }
        }
        other => return Err(QueryError::NotAStruct(kind(&other))),
    }
    Ok(values)
}

fn flatten(values: &mut QueryValues, key: &str, value: &Value) -> Result<(), QueryError> {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Null => {}
                    Value::Array(_) | Value::Object(_) => {
                        return Err(QueryError::Unsupported {
                            key: key.to_owned(),
                            kind: kind(item),
                        })
                    }
                    scalar => values.add(key, scalar_to_string(scalar)),
                }
            }
        }
        Value::Object(fields) => {
            for (child, field) in fields {
                flatten(values, &format!("{key}[{child}]"), field)?;
            }
        }
        scalar => values.add(key, scalar_to_string(scalar)),
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}
