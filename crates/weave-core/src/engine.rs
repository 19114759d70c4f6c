//! Query engine boundary.
//!
//! The orchestrator never implements parsing, validation, execution, or
//! subscription itself — an external [`QueryEngine`] supplies those and the
//! engine plugin installs them into the per-request function slots. Plugins
//! may replace any slot before the phase runs; the dispatcher reads a slot
//! only after every before-hook has had its chance to write it.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::context::SharedContext;
use crate::request::{Document, QueryRequest};
use crate::response::QueryError;
use crate::result::ExecutionResult;
use crate::schema::Schema;

/// Arguments handed to the execute and subscribe phase functions.
#[derive(Debug)]
pub struct ExecutionArgs {
    /// Schema in effect for this request, when one is registered.
    pub schema: Option<Schema>,
    /// Parsed document to run.
    pub document: Document,
    /// Operation to run when the document defines several.
    pub operation_name: Option<String>,
    /// Variable values referenced by the operation.
    pub variables: Map<String, Value>,
    /// The request's shared context bag.
    pub context: SharedContext,
}

/// The underlying query engine: an external collaborator supplying the
/// default phase functions the orchestrator wraps.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Parse raw source into a [`Document`].
    fn parse(&self, request: &QueryRequest) -> Result<Document, QueryError>;

    /// Validate a document against a schema. An empty vec means valid.
    fn validate(&self, schema: &Schema, document: &Document) -> Vec<QueryError>;

    /// Execute a request to completion.
    async fn execute(&self, args: ExecutionArgs) -> ExecutionResult;

    /// Start a subscription, yielding a streamed result.
    async fn subscribe(&self, args: ExecutionArgs) -> ExecutionResult;
}

/// Replaceable parse function slot contents.
pub type ParseFn = Arc<dyn Fn(&QueryRequest) -> Result<Document, QueryError> + Send + Sync>;

/// Replaceable validate function slot contents.
pub type ValidateFn = Arc<dyn Fn(&Schema, &Document) -> Vec<QueryError> + Send + Sync>;

/// Replaceable execute function slot contents.
pub type ExecuteFn = Arc<dyn Fn(ExecutionArgs) -> BoxFuture<'static, ExecutionResult> + Send + Sync>;

/// Replaceable subscribe function slot contents.
pub type SubscribeFn =
    Arc<dyn Fn(ExecutionArgs) -> BoxFuture<'static, ExecutionResult> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBag;
    use crate::response::Response;
    use futures::StreamExt;
    use serde_json::json;

    struct EchoEngine;

    #[async_trait]
    impl QueryEngine for EchoEngine {
        fn parse(&self, request: &QueryRequest) -> Result<Document, QueryError> {
            Ok(Document::new(request.source.clone(), Value::Null))
        }

        fn validate(&self, _schema: &Schema, _document: &Document) -> Vec<QueryError> {
            Vec::new()
        }

        async fn execute(&self, args: ExecutionArgs) -> ExecutionResult {
            ExecutionResult::Single(Response::data(json!(args.document.source)))
        }

        async fn subscribe(&self, _args: ExecutionArgs) -> ExecutionResult {
            ExecutionResult::Stream(futures::stream::empty().boxed())
        }
    }

    fn args_for(source: &str) -> ExecutionArgs {
        ExecutionArgs {
            schema: None,
            document: Document::new(source, Value::Null),
            operation_name: None,
            variables: Map::new(),
            context: Arc::new(ContextBag::new()),
        }
    }

    #[test]
    fn test_engine_parse() {
        let engine = EchoEngine;
        let document = engine.parse(&QueryRequest::new("{ a }")).unwrap();
        assert_eq!(document.source, "{ a }");
    }

    #[tokio::test]
    async fn test_engine_execute_through_slot() {
        let engine: Arc<dyn QueryEngine> = Arc::new(EchoEngine);
        let execute: ExecuteFn = {
            let engine = Arc::clone(&engine);
            Arc::new(move |args| {
                let engine = Arc::clone(&engine);
                Box::pin(async move { engine.execute(args).await })
            })
        };

        let result = execute(args_for("{ a }")).await;
        let response = result.into_single().unwrap();
        assert_eq!(response.data, Some(json!("{ a }")));
    }

    #[test]
    fn test_execution_args_debug() {
        let args = args_for("{ a }");
        assert!(format!("{args:?}").contains("ExecutionArgs"));
    }
}
