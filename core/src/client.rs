//! Client facade holding the defaults shared by every request.
//!
//! # Design
//! `Client` owns the base URL, default headers, default query parameters and
//! query structures, plus the [`Executor`] that performs round trips. Every
//! configuration method takes `&mut self` and returns it for chaining.
//! Requests borrow the client, so its defaults are read at send time and
//! cannot change while a request is being built.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::header;
use crate::query::QueryEncodable;
use crate::request::Request;
use crate::transport::{default_executor, Executor, UreqExecutor};

/// Shared request defaults and the executor that sends requests.
pub struct Client {
    executor: Arc<dyn Executor>,
    base_url: String,
    headers: HeaderMap,
    query_structs: Vec<Box<dyn QueryEncodable>>,
    query_params: BTreeMap<String, String>,
}

impl Client {
    /// Create a client rooted at `base_url`, using the default executor.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            executor: default_executor(),
            base_url: base_url.into(),
            headers: HeaderMap::new(),
            query_structs: Vec::new(),
            query_params: BTreeMap::new(),
        }
    }

    /// Build a client from deserialized configuration.
    ///
    /// A configured timeout gets its own executor; otherwise the shared
    /// default executor is used.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(config.base_url.as_str());
        if let Some(timeout) = config.timeout() {
            client.executor(Some(Arc::new(UreqExecutor::with_timeout(timeout))));
        }
        for (key, value) in &config.headers {
            client.add_header(key, value);
        }
        for (key, value) in &config.query {
            client.add_query_param(key, value);
        }
        if let Some(auth) = &config.basic_auth {
            client.set_basic_auth(&auth.username, &auth.password);
        }
        client
    }

    /// Replace the executor. `None` restores the default executor.
    pub fn executor(&mut self, executor: Option<Arc<dyn Executor>>) -> &mut Self {
        self.executor = executor.unwrap_or_else(default_executor);
        self
    }

    /// Append a default header value, keeping values already set for `key`.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        header::append(&mut self.headers, key, value);
        self
    }

    /// Set a default header, replacing any values already set for `key`.
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        header::insert(&mut self.headers, key, value);
        self
    }

    /// Set the default `Authorization` header to HTTP Basic credentials.
    /// The credentials are only base64 encoded, not encrypted.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        let value = header::basic_auth(username, password);
        self.set_header(http::header::AUTHORIZATION.as_str(), &value)
    }

    /// Add a structure whose fields are encoded into every request's query.
    pub fn add_query_struct<T>(&mut self, query: T) -> &mut Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.query_structs.push(Box::new(query));
        self
    }

    /// Add a default query parameter. Empty keys or values are ignored.
    pub fn add_query_param(&mut self, key: &str, value: &str) -> &mut Self {
        if !key.is_empty() && !value.is_empty() {
            self.query_params.insert(key.to_owned(), value.to_owned());
        }
        self
    }

    /// Start a `GET` request against the base URL.
    pub fn request(&self) -> Request<'_> {
        Request::new(self)
    }

    pub fn head(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.head(path);
        request
    }

    pub fn get(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.get(path);
        request
    }

    pub fn post(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.post(path);
        request
    }

    pub fn put(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.put(path);
        request
    }

    pub fn patch(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.patch(path);
        request
    }

    pub fn delete(&self, path: &str) -> Request<'_> {
        let mut request = self.request();
        request.delete(path);
        request
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub(crate) fn query_structs(&self) -> &[Box<dyn QueryEncodable>] {
        &self.query_structs
    }

    pub(crate) fn executor_ref(&self) -> &dyn Executor {
        self.executor.as_ref()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("query_params", &self.query_params)
            .field("query_structs", &self.query_structs.len())
            .finish_non_exhaustive()
    }
}
