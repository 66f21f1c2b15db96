//! The live request an app is asked to run against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// URI and GET/POST variables of the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Requested URI (path and query as received).
    pub uri: String,
    /// Query-string variables.
    #[serde(default)]
    pub get_vars: HashMap<String, String>,
    /// Form variables.
    #[serde(default)]
    pub post_vars: HashMap<String, String>,
}

impl RequestInfo {
    /// Creates a request for the given URI with no variables.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Adds a GET variable.
    pub fn with_get(mut self, name: &str, value: &str) -> Self {
        self.get_vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a POST variable.
    pub fn with_post(mut self, name: &str, value: &str) -> Self {
        self.post_vars.insert(name.to_string(), value.to_string());
        self
    }
}
