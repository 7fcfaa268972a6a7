//! Request and response bodies.
//!
//! # Design
//! [`Body`] is the byte stream carried by both the wire request handed to an
//! [`Executor`](crate::Executor) and the response it returns. It is either
//! absent, an in-memory buffer, or an arbitrary `Read + Send` stream.
//!
//! A [`BodyProvider`] turns a caller value into a `Body` plus the content type
//! that describes it. Three providers ship with the crate: raw passthrough,
//! JSON and form-urlencoded. Providers are consulted at send time, so a JSON
//! or form payload is encoded only when the request is built.

use std::fmt;
use std::io::{self, Cursor, Read};

use serde::Serialize;

use crate::error::Error;
use crate::query::to_query_values;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A readable request or response body.
pub struct Body {
    kind: Kind,
}

enum Kind {
    Empty,
    Bytes(Cursor<Vec<u8>>),
    Reader(Box<dyn Read + Send>),
}

impl Body {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            kind: Kind::Reader(Box::new(reader)),
        }
    }

    /// True when no body was attached at all. An empty buffer is still a body.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Empty)
    }

    /// The in-memory contents, when the body is buffered.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            Kind::Bytes(cursor) => Some(cursor.get_ref()),
            _ => None,
        }
    }

    /// Read the remainder of the body into memory.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self.kind {
            Kind::Empty => Ok(Vec::new()),
            Kind::Bytes(cursor) => {
                let pos = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
                let mut bytes = cursor.into_inner();
                bytes.drain(..pos.min(bytes.len()));
                Ok(bytes)
            }
            Kind::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Bytes(cursor) => cursor.read(buf),
            Kind::Reader(reader) => reader.read(buf),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            kind: Kind::Bytes(Cursor::new(bytes)),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("Body(empty)"),
            Kind::Bytes(cursor) => write!(f, "Body({} bytes)", cursor.get_ref().len()),
            Kind::Reader(_) => f.write_str("Body(stream)"),
        }
    }
}

/// Supplies the body of a request together with its content type.
pub trait BodyProvider: Send {
    /// Content type of the body, or `""` to leave the header alone.
    fn content_type(&self) -> &str;

    /// Produce the body stream.
    fn body(&mut self) -> Result<Body, Error>;
}

/// Passes a caller-supplied stream through untouched.
///
/// The stream can only be read once; building the request a second time
/// yields an empty body.
#[derive(Debug)]
pub struct RawBody {
    body: Option<Body>,
}

impl RawBody {
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }
}

impl BodyProvider for RawBody {
    fn content_type(&self) -> &str {
        ""
    }

    fn body(&mut self) -> Result<Body, Error> {
        Ok(self.body.take().unwrap_or_default())
    }
}

/// Encodes a serializable value as JSON.
#[derive(Debug)]
pub struct JsonBody<T> {
    payload: T,
}

impl<T: Serialize + Send> JsonBody<T> {
    pub fn new(payload: T) -> Self {
        Self { payload }
    }
}

impl<T: Serialize + Send> BodyProvider for JsonBody<T> {
    fn content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    /// One line of JSON terminated by `\n`, as a streaming encoder writes it.
    fn body(&mut self) -> Result<Body, Error> {
        let mut bytes = serde_json::to_vec(&self.payload)?;
        bytes.push(b'\n');
        Ok(Body::from(bytes))
    }
}

/// Encodes a serializable structure as `application/x-www-form-urlencoded`.
///
/// Field rules are the same as for query structures.
#[derive(Debug)]
pub struct FormBody<T> {
    payload: T,
}

impl<T: Serialize + Send> FormBody<T> {
    pub fn new(payload: T) -> Self {
        Self { payload }
    }
}

impl<T: Serialize + Send> BodyProvider for FormBody<T> {
    fn content_type(&self) -> &str {
        FORM_CONTENT_TYPE
    }

    fn body(&mut self) -> Result<Body, Error> {
        let values = to_query_values(&self.payload)?;
        Ok(Body::from(values.encode()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[derive(Serialize)]
    struct Payload {
        #[serde(rename = "Foo")]
        foo: &'static str,
    }

    #[test]
    fn json_body_is_one_line_with_content_type() {
        let mut provider = JsonBody::new(Payload { foo: "bar" });
        assert_eq!(provider.content_type(), "application/json");
        let body = provider.body().unwrap();
        assert_eq!(body.as_bytes().unwrap(), b"{\"Foo\":\"bar\"}\n");
    }

    #[test]
    fn form_body_is_urlencoded_and_sorted() {
        #[derive(Serialize)]
        struct Login {
            username: &'static str,
            password: &'static str,
            scope: Vec<&'static str>,
        }
        let mut provider = FormBody::new(Login {
            username: "ada lovelace",
            password: "p&ss",
            scope: vec!["read", "write"],
        });
        assert_eq!(provider.content_type(), "application/x-www-form-urlencoded");
        let body = provider.body().unwrap().into_bytes().unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "password=p%26ss&scope=read&scope=write&username=ada+lovelace"
        );
    }

    #[test]
    fn form_body_rejects_non_struct_payload() {
        let mut provider = FormBody::new(vec![1, 2, 3]);
        let err = provider.body().unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::NotAStruct("sequence"))));
    }

    #[test]
    fn raw_body_has_no_content_type_and_is_yielded_once() {
        let mut provider = RawBody::new(Body::from_reader(&b"raw bytes"[..]));
        assert_eq!(provider.content_type(), "");
        assert_eq!(provider.body().unwrap().into_bytes().unwrap(), b"raw bytes");
        assert!(provider.body().unwrap().is_empty());
    }

    #[test]
    fn partially_read_buffer_keeps_remaining_bytes() {
        let mut body = Body::from("hello world");
        let mut head = [0u8; 6];
        body.read_exact(&mut head).unwrap();
        assert_eq!(body.into_bytes().unwrap(), b"world");
    }

    #[test]
    fn fully_read_buffer_yields_no_bytes() {
        let mut body = Body::from("done");
        io::copy(&mut body, &mut io::sink()).unwrap();
        assert!(body.into_bytes().unwrap().is_empty());
    }
}
