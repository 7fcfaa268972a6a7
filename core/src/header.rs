//! Header helpers shared by the client defaults and per-request headers.
//!
//! Names and values arrive as plain strings. Anything `http` refuses to
//! represent is dropped with a debug log instead of failing the builder chain.

use base64::Engine as _;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

fn parse(key: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = match HeaderName::from_bytes(key.as_bytes()) {
        Ok(name) => name,
        Err(e) => {
            debug!(header = key, error = %e, "ignoring header with invalid name");
            return None;
        }
    };
    let value = match HeaderValue::from_str(value) {
        Ok(value) => value,
        Err(e) => {
            debug!(header = key, error = %e, "ignoring header with invalid value");
            return None;
        }
    };
    Some((name, value))
}

/// Append `value` to the values already stored under `key`.
pub(crate) fn append(headers: &mut HeaderMap, key: &str, value: &str) {
    if let Some((name, value)) = parse(key, value) {
        headers.append(name, value);
    }
}

/// Replace every value stored under `key` with `value`.
pub(crate) fn insert(headers: &mut HeaderMap, key: &str, value: &str) {
    if let Some((name, value)) = parse(key, value) {
        headers.insert(name, value);
    }
}

/// `Basic` credentials as defined by RFC 7617.
pub(crate) fn basic_auth(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
