//! Error types for request building, dispatch and response decoding.
//!
//! # Design
//! Every failure is returned to the immediate caller. The variants follow the
//! order in which a request can fail: the URL, the query structures, the body,
//! the wire request, the transport and finally the decoder. A decode failure
//! still carries the response head so callers can inspect the status and
//! headers of a response whose body did not match the expected shape.

use crate::query::QueryError;

/// Boxed error used at the executor, body provider and decoder seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by [`Request::send`](crate::Request::send),
/// [`Request::execute`](crate::Request::execute) and
/// [`Request::decode`](crate::Request::decode).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolved request URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The URL is rejected before parsing: a raw control character, a bad
    /// percent escape, or a colon in the first segment of a scheme-less path.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    /// The existing query could not be parsed, or a query structure or form
    /// body could not be encoded.
    #[error("query encoding failed: {0}")]
    Query(#[from] QueryError),

    /// A JSON body could not be serialized.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A raw body stream could not be read.
    #[error("reading request body failed: {0}")]
    Io(#[from] std::io::Error),

    /// A custom body provider failed to produce its stream.
    #[error("body provider failed: {0}")]
    Body(#[source] BoxError),

    /// The wire request could not be assembled.
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    /// The executor failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(#[source] BoxError),

    /// The response arrived but its body did not decode into the target.
    #[error("decoding response body failed: {source}")]
    Decode {
        response: Box<http::Response<()>>,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Response head attached to a decode failure.
    pub fn response(&self) -> Option<&http::Response<()>> {
        match self {
            Error::Decode { response, .. } => Some(response),
            _ => None,
        }
    }
}
