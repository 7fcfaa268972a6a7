//! Recording executor used by the unit tests.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::body::Body;
use crate::error::BoxError;
use crate::transport::Executor;

/// A request as the executor saw it.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: http::Method,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: Vec<u8>,
}

enum Canned {
    Response(http::Response<Body>),
    Failure(String),
}

/// Replays queued responses and records every request it executes.
/// With an empty queue it answers `200` with no body.
pub(crate) struct MockExecutor {
    queue: Mutex<VecDeque<Canned>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response with a `Content-Length` matching `body`.
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        let response = http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        self.push(Canned::Response(response))
    }

    /// Queue a response without `Content-Length` whose body reports when it
    /// has been read to the end.
    pub fn respond_tracked(&self, status: u16, body: &str) -> Arc<AtomicBool> {
        let drained = Arc::new(AtomicBool::new(false));
        let reader = TrackedReader {
            inner: io::Cursor::new(body.as_bytes().to_vec()),
            drained: drained.clone(),
        };
        let response = http::Response::builder()
            .status(status)
            .body(Body::from_reader(reader))
            .unwrap();
        self.push(Canned::Response(response));
        drained
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.push(Canned::Failure(message.to_owned()))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request was executed")
    }

    fn push(&self, canned: Canned) -> &Self {
        self.queue.lock().unwrap().push_back(canned);
        self
    }
}

impl Executor for MockExecutor {
    fn execute(&self, request: http::Request<Body>) -> Result<http::Response<Body>, BoxError> {
        let (parts, body) = request.into_parts();
        self.recorded.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body: body.into_bytes()?,
        });
        match self.queue.lock().unwrap().pop_front() {
            Some(Canned::Response(response)) => Ok(response),
            Some(Canned::Failure(message)) => Err(message.into()),
            None => Ok(http::Response::new(Body::empty())),
        }
    }
}

struct TrackedReader {
    inner: io::Cursor<Vec<u8>>,
    drained: Arc<AtomicBool>,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.drained.store(true, Ordering::SeqCst);
        }
        Ok(n)
    }
}
