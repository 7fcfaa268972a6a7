//! Deserializable client configuration.
//!
//! # Design
//! `ClientConfig` is plain serde data so it can come from a JSON file, an
//! environment-driven loader or a test literal. [`Client::from_config`]
//! applies it through the same setters a caller would use, so the empty
//! key/value and malformed header rules hold for configured defaults too.
//!
//! [`Client::from_config`]: crate::Client::from_config

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Defaults applied to a [`Client`](crate::Client) at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,

    /// Header name/value pairs, appended in order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    #[serde(default)]
    pub query: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,

    /// Whole-request timeout for the default executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
