//! Fluent HTTP request building in front of a pluggable executor.
//!
//! # Overview
//! A [`Client`] holds shared defaults: base URL, headers, query parameters,
//! query structures and the [`Executor`] used for round trips. Each call
//! builds a [`Request`] that resolves a path against the base URL, adds its
//! own headers, query values and body, and then either produces a wire
//! request ([`Request::send`]) or runs it and decodes the JSON response into
//! a success or failure target depending on the status code
//! ([`Request::decode`]).
//!
//! # Design
//! - The executor is a one-method trait; the default is backed by `ureq`.
//!   Substitute any implementation to mock, intercept or layer middleware.
//! - Query structures and form bodies are plain `serde::Serialize` types.
//! - Defaults are merged at send time, client values first, always additively.
//! - Errors are returned, never logged in place of being returned.
//!
//! ```no_run
//! use httpman::Client;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct ListParams {
//!     tag: Option<String>,
//!     limit: u32,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct ApiError {
//!     err: String,
//! }
//!
//! let mut client = Client::new("http://localhost:3000/");
//! client.set_header("Accept", "application/json");
//!
//! let mut widgets: Vec<serde_json::Value> = Vec::new();
//! let mut failure = ApiError::default();
//! let response = client
//!     .get("widgets")
//!     .add_query_struct(ListParams { tag: Some("blue".into()), limit: 10 })
//!     .decode(Some(&mut widgets), Some(&mut failure))?;
//! println!("{} -> {} widgets", response.status(), widgets.len());
//! # Ok::<(), httpman::Error>(())
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
mod header;
pub mod query;
pub mod request;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use body::{Body, BodyProvider, FormBody, JsonBody, RawBody};
pub use client::Client;
pub use config::{BasicAuth, ClientConfig};
pub use decoder::{JsonDecoder, ResponseDecoder};
pub use error::{BoxError, Error};
pub use query::{to_query_values, QueryEncodable, QueryError, QueryValues};
pub use request::Request;
pub use transport::{default_executor, Executor, UreqExecutor};
