//! Query request input and parse output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An incoming query: raw source text plus execution parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Raw query source text.
    pub source: String,
    /// Operation to run when the source defines several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    /// Variable values referenced by the operation.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
    /// Protocol-level extensions supplied by the caller.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl QueryRequest {
    /// Create a request from source text.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Set the variable values.
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// Parse output: the source it came from and an engine-defined AST value.
///
/// The orchestrator treats the AST as opaque; only the underlying query
/// engine interprets it.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Source text the document was parsed from.
    pub source: String,
    /// Engine-defined parsed representation.
    pub ast: Value,
}

impl Document {
    /// Create a document.
    #[must_use]
    pub fn new(source: impl Into<String>, ast: Value) -> Self {
        Self {
            source: source.into(),
            ast,
        }
    }
}
