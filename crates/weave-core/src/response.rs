//! Response payloads and query-level error values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single execution response: data, errors, and optional extensions.
///
/// Engine failures are error *values*, not control flow — a failed parse or
/// a resolver error travels through the after-hook chain like any other
/// result so plugins can observe or recover it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Result payload, absent when execution failed outright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Errors raised while producing the payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
    /// Protocol-level extensions added by plugins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl Response {
    /// Create a successful response carrying `data`.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Create a failed response carrying a single error.
    #[must_use]
    pub fn error(error: QueryError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Whether the response carries any errors.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// An error produced by the underlying query engine.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct QueryError {
    /// Human-readable description.
    pub message: String,
    /// Path into the response data the error applies to, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl QueryError {
    /// Create an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Attach a response path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = Some(path);
        self
    }
}
