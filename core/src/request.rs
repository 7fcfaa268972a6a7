//! Per-call request builder.
//!
//! # Design
//! A [`Request`] borrows its [`Client`] and accumulates request-local state:
//! method, resolved URL, headers, query parameters, query structures and at
//! most one body provider. Nothing is merged with the client defaults until
//! [`send`](Request::send), which always applies the client's values first
//! and the request's values second, additively.
//!
//! Path resolution is lenient while building: a base URL or path that does
//! not parse leaves the previously resolved URL in place. The same URL is
//! parsed again by `send`, where a failure is reported.

use std::collections::BTreeMap;

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::body::{Body, BodyProvider, FormBody, JsonBody, RawBody};
use crate::client::Client;
use crate::decoder::{JsonDecoder, ResponseDecoder};
use crate::error::Error;
use crate::header;
use crate::query::{invalid_escape, QueryEncodable, QueryValues};
use crate::transport::content_length;

/// Builder for a single request. Obtain one from [`Client::request`] or one of
/// the method shortcuts such as [`Client::get`].
pub struct Request<'c, D = JsonDecoder> {
    client: &'c Client,
    method: Method,
    absolute_url: String,
    headers: http::HeaderMap,
    body: Option<Box<dyn BodyProvider>>,
    query_structs: Vec<Box<dyn QueryEncodable>>,
    query_params: BTreeMap<String, String>,
    decoder: D,
}

impl<'c> Request<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self {
            client,
            method: Method::GET,
            absolute_url: client.base_url().to_owned(),
            headers: http::HeaderMap::new(),
            body: None,
            query_structs: Vec::new(),
            query_params: BTreeMap::new(),
            decoder: JsonDecoder,
        }
    }
}

impl<'c, D: ResponseDecoder> Request<'c, D> {
    pub fn head(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::HEAD, path)
    }

    pub fn get(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::GET, path)
    }

    pub fn post(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::POST, path)
    }

    pub fn put(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::PUT, path)
    }

    pub fn patch(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::PATCH, path)
    }

    pub fn delete(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::DELETE, path)
    }

    pub fn options(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::OPTIONS, path)
    }

    pub fn trace(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::TRACE, path)
    }

    pub fn connect(&mut self, path: &str) -> &mut Self {
        self.method_path(Method::CONNECT, path)
    }

    fn method_path(&mut self, method: Method, path: &str) -> &mut Self {
        self.method = method;
        self.path(path)
    }

    /// Resolve `path` against the client's base URL as a URI reference.
    /// If either fails to parse, the current URL is kept.
    pub fn path(&mut self, path: &str) -> &mut Self {
        match resolve(self.client.base_url(), path) {
            Some(url) => self.absolute_url = url,
            None => debug!(base = self.client.base_url(), path, "path did not resolve, keeping previous URL"),
        }
        self
    }

    /// Append a header value, keeping values already set for `key`.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        header::append(&mut self.headers, key, value);
        self
    }

    /// Set a header, replacing any values already set for `key`.
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        header::insert(&mut self.headers, key, value);
        self
    }

    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        let value = header::basic_auth(username, password);
        self.set_header(http::header::AUTHORIZATION.as_str(), &value)
    }

    pub fn add_query_struct<T>(&mut self, query: T) -> &mut Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.query_structs.push(Box::new(query));
        self
    }

    /// Add a query parameter. Empty keys or values are ignored.
    pub fn add_query_param(&mut self, key: &str, value: &str) -> &mut Self {
        if !key.is_empty() && !value.is_empty() {
            self.query_params.insert(key.to_owned(), value.to_owned());
        }
        self
    }

    /// Send `body` as is, without touching `Content-Type`.
    pub fn body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.body_provider(RawBody::new(body))
    }

    /// Install a body provider, replacing any earlier body. A non-empty
    /// content type replaces the `Content-Type` header.
    pub fn body_provider<P: BodyProvider + 'static>(&mut self, provider: P) -> &mut Self {
        let content_type = provider.content_type();
        if !content_type.is_empty() {
            header::insert(&mut self.headers, http::header::CONTENT_TYPE.as_str(), content_type);
        }
        self.body = Some(Box::new(provider));
        self
    }

    /// Encode `payload` as the JSON body.
    pub fn body_json<T: Serialize + Send + 'static>(&mut self, payload: T) -> &mut Self {
        self.body_provider(JsonBody::new(payload))
    }

    /// Encode `payload` as a form-urlencoded body.
    pub fn body_form<T: Serialize + Send + 'static>(&mut self, payload: T) -> &mut Self {
        self.body_provider(FormBody::new(payload))
    }

    /// Swap the decoder used for response bodies.
    pub fn with_decoder<E: ResponseDecoder>(self, decoder: E) -> Request<'c, E> {
        Request {
            client: self.client,
            method: self.method,
            absolute_url: self.absolute_url,
            headers: self.headers,
            body: self.body,
            query_structs: self.query_structs,
            query_params: self.query_params,
            decoder,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The resolved URL, before query merging.
    pub fn url(&self) -> &str {
        &self.absolute_url
    }

    /// Request-local headers, without the client defaults.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Build the wire request, merging client defaults with request values.
    ///
    /// The final query string holds, sorted by key: the query already on the
    /// URL, every query structure (client first), and every query parameter
    /// (client first). Headers are appended client first.
    pub fn send(&mut self) -> Result<http::Request<Body>, Error> {
        let mut url = parse_url(&self.absolute_url)?;

        let mut query = QueryValues::parse(url.query().unwrap_or_default())?;
        for structure in self.client.query_structs().iter().chain(&self.query_structs) {
            query.merge(structure.encode_query()?);
        }

        let body = match self.body.as_mut() {
            Some(provider) => provider.body()?,
            None => Body::empty(),
        };

        for (key, value) in self.client.query_params().iter().chain(&self.query_params) {
            query.add(key.as_str(), value.as_str());
        }
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&query.encode()));
        }

        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(url.as_str())
            .body(body)?;

        let headers = request.headers_mut();
        for (name, value) in self.client.headers().iter().chain(self.headers.iter()) {
            headers.append(name.clone(), value.clone());
        }

        debug!(method = %self.method, url = %url, "built request");
        Ok(request)
    }

    /// [`send`](Self::send) then [`execute`](Self::execute).
    pub fn decode<S, F>(&mut self, success: Option<&mut S>, failure: Option<&mut F>) -> Result<http::Response<()>, Error>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        let request = self.send()?;
        self.execute(request, success, failure)
    }

    /// Decode 2xx bodies into `success`; other bodies are discarded.
    pub fn decode_success<S: DeserializeOwned>(&mut self, success: &mut S) -> Result<http::Response<()>, Error> {
        self.decode(Some(success), None::<&mut ()>)
    }

    /// Run `request` through the client's executor and decode the response.
    ///
    /// 2xx bodies decode into `success`, anything else into `failure`; a
    /// missing target skips decoding. A `204` or a declared zero length
    /// skips decoding altogether. The body is drained before returning on
    /// every path so the transport can reuse the connection.
    pub fn execute<S, F>(
        &self,
        request: http::Request<Body>,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<http::Response<()>, Error>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        let response = self.client.executor_ref().execute(request).map_err(Error::Transport)?;
        let (parts, body) = response.into_parts();
        let mut body = Drained(body);
        let response = http::Response::from_parts(parts, ());
        debug!(status = %response.status(), "received response");

        if response.status() == StatusCode::NO_CONTENT || content_length(response.headers()) == Some(0) {
            trace!("empty response body, skipping decode");
            return Ok(response);
        }

        let decoded = if response.status().is_success() {
            success.map(|target| self.decoder.decode(&mut body.0, target))
        } else {
            failure.map(|target| self.decoder.decode(&mut body.0, target))
        };
        match decoded {
            Some(Err(source)) => Err(Error::Decode {
                response: Box::new(response),
                source,
            }),
            _ => Ok(response),
        }
    }
}

/// Reads the rest of a response body when dropped.
struct Drained(Body);

impl Drop for Drained {
    fn drop(&mut self) {
        if let Err(e) = std::io::copy(&mut self.0, &mut std::io::sink()) {
            trace!(error = %e, "draining response body failed");
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, Error> {
    check_reference(raw)?;
    Ok(Url::parse(raw)?)
}

fn resolve(base: &str, path: &str) -> Option<String> {
    let base = parse_url(base).ok()?;
    check_reference(path).ok()?;
    base.join(path).ok().map(String::from)
}

/// Reject references the lenient WHATWG parser would otherwise repair. The
/// query is left to [`QueryValues::parse`].
fn check_reference(raw: &str) -> Result<(), Error> {
    let invalid = |reason| {
        Err(Error::InvalidUrl {
            url: raw.to_owned(),
            reason,
        })
    };
    if raw.chars().any(|c| c.is_ascii_control()) {
        return invalid("invalid control character");
    }

    let (rest, fragment) = raw.split_once('#').unwrap_or((raw, ""));
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    if invalid_escape(path).is_some() || invalid_escape(fragment).is_some() {
        return invalid("invalid percent escape");
    }

    let first_segment = path.split('/').next().unwrap_or_default();
    if let Some((scheme, _)) = first_segment.split_once(':') {
        if scheme.is_empty() {
            return invalid("missing protocol scheme");
        }
        if !is_scheme(scheme) {
            return invalid("first path segment cannot contain colon");
        }
    }
    Ok(())
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
