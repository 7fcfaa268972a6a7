//! The executor seam between request building and the network.
//!
//! # Design
//! Requests and responses are plain `http` crate values carrying a [`Body`].
//! An [`Executor`] turns one into the other; the crate never talks to the
//! network itself. [`UreqExecutor`] is the default implementation. Any other
//! type implementing the trait can be injected into a
//! [`Client`](crate::Client) to intercept, mock or layer middleware around
//! the round trip.
//!
//! Non-2xx statuses are responses, not errors: the executor only fails when
//! no response was received at all.

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::body::Body;
use crate::error::BoxError;

/// Executes a wire request and returns the response.
pub trait Executor: Send + Sync {
    fn execute(&self, request: http::Request<Body>) -> Result<http::Response<Body>, BoxError>;
}

static DEFAULT_EXECUTOR: LazyLock<Arc<UreqExecutor>> = LazyLock::new(|| Arc::new(UreqExecutor::default()));

/// The process-wide executor used when none is configured.
pub fn default_executor() -> Arc<dyn Executor> {
    DEFAULT_EXECUTOR.clone()
}

/// Executor backed by a `ureq::Agent`.
///
/// The agent is configured to return 4xx/5xx responses as data so the
/// request builder can route them to the failure target.
#[derive(Clone)]
pub struct UreqExecutor {
    agent: ureq::Agent,
}

impl UreqExecutor {
    /// Wrap an existing agent. The agent should have
    /// `http_status_as_error(false)` or error statuses surface as
    /// transport failures.
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    /// Agent with a global timeout covering the whole round trip.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqExecutor {
    fn default() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl fmt::Debug for UreqExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqExecutor").finish_non_exhaustive()
    }
}

impl Executor for UreqExecutor {
    fn execute(&self, request: http::Request<Body>) -> Result<http::Response<Body>, BoxError> {
        let (parts, body) = request.into_parts();
        let response = if body.is_empty() {
            self.agent.run(http::Request::from_parts(parts, ()))?
        } else {
            let bytes = body.into_bytes()?;
            self.agent.run(http::Request::from_parts(parts, bytes))?
        };
        Ok(response.map(|body| Body::from_reader(body.into_reader())))
    }
}

/// Declared `Content-Length` of a response, if present and well formed.
pub(crate) fn content_length(headers: &http::HeaderMap) -> Option<u64> {
    headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
