//! Execution result sum type.
//!
//! Execution and subscription produce either one [`Response`] or an async
//! sequence of them (subscriptions, incremental delivery). Both shapes flow
//! through the same after-hook contract; the orchestrator's result
//! interceptor normalizes the difference.

use std::fmt;

use futures::stream::BoxStream;

use crate::response::Response;

/// A pull-based stream of responses, boxed for object-safe plumbing.
pub type ResponseStream = BoxStream<'static, Response>;

/// Outcome of the execute or subscribe phase.
pub enum ExecutionResult {
    /// One response, delivered immediately.
    Single(Response),
    /// An async sequence of responses.
    Stream(ResponseStream),
}

impl ExecutionResult {
    /// Whether this result is a stream.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Extract the single response, if that is the shape.
    #[must_use]
    pub fn into_single(self) -> Option<Response> {
        match self {
            Self::Single(response) => Some(response),
            Self::Stream(_) => None,
        }
    }

    /// Extract the stream, if that is the shape.
    #[must_use]
    pub fn into_stream(self) -> Option<ResponseStream> {
        match self {
            Self::Single(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl From<Response> for ExecutionResult {
    fn from(response: Response) -> Self {
        Self::Single(response)
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(response) => f.debug_tuple("Single").field(response).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[test]
    fn test_single_shape() {
        let result = ExecutionResult::Single(Response::data(json!(1)));
        assert!(!result.is_stream());
        assert!(result.into_single().is_some());
    }

    #[test]
    fn test_stream_shape() {
        let stream = futures::stream::iter(vec![Response::data(json!(1))]).boxed();
        let result = ExecutionResult::Stream(stream);
        assert!(result.is_stream());
        assert!(result.into_stream().is_some());
    }

    #[test]
    fn test_from_response() {
        let result: ExecutionResult = Response::data(json!("x")).into();
        assert!(!result.is_stream());
    }

    #[tokio::test]
    async fn test_stream_yields_items() {
        let items = vec![Response::data(json!(1)), Response::data(json!(2))];
        let stream = futures::stream::iter(items).boxed();
        let collected: Vec<_> = ExecutionResult::Stream(stream)
            .into_stream()
            .unwrap()
            .collect()
            .await;
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn test_debug_impl() {
        let single = ExecutionResult::Single(Response::default());
        assert!(format!("{single:?}").contains("Single"));
        let stream = ExecutionResult::Stream(futures::stream::empty().boxed());
        assert!(format!("{stream:?}").contains("Stream"));
    }
}
