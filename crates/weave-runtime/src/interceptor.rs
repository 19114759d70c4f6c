//! Execution result interceptor.
//!
//! Execute and subscribe before-hooks return [`OnDone`] callbacks. The
//! interceptor runs them in reverse registration order against the produced
//! result — single response or stream alike — and, for streams, installs the
//! per-item mutators and end-of-stream callbacks the hooks registered.
//!
//! The end signal is anchored to the stream's lifetime, not only to
//! exhaustion: completion, an early consumer teardown (dropping the stream
//! mid-iteration), or dropping an never-polled stream all fire the `on_end`
//! callbacks exactly once. Subscription resource cleanup hangs off this
//! guarantee.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

use weave_core::context::SharedContext;
use weave_core::response::Response;
use weave_core::result::{ExecutionResult, ResponseStream};
use weave_hooks::contexts::{DoneContext, OnDone, OnEnd, OnNext};

/// Stream adapter applying per-item mutators and an exactly-once end signal.
pub struct InterceptedStream {
    inner: ResponseStream,
    on_next: Vec<OnNext>,
    on_end: Vec<OnEnd>,
    ended: bool,
}

impl InterceptedStream {
    /// Wrap a stream with the given hooks.
    ///
    /// `on_next` mutators run in vec order for every item; `on_end`
    /// callbacks fire in vec order exactly once.
    #[must_use]
    pub fn new(inner: ResponseStream, on_next: Vec<OnNext>, on_end: Vec<OnEnd>) -> Self {
        Self {
            inner,
            on_next,
            on_end,
            ended: false,
        }
    }

    fn fire_end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        for on_end in self.on_end.drain(..) {
            on_end();
        }
    }
}

impl Stream for InterceptedStream {
    type Item = Response;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Response>> {
        let this = self.get_mut();
        if this.ended {
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(mut item)) => {
                for on_next in &mut this.on_next {
                    on_next(&mut item);
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.fire_end();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for InterceptedStream {
    fn drop(&mut self) {
        // Early consumer teardown still signals end-of-stream, exactly once.
        self.fire_end();
    }
}

impl std::fmt::Debug for InterceptedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptedStream")
            .field("on_next", &self.on_next.len())
            .field("on_end", &self.on_end.len())
            .field("ended", &self.ended)
            .finish()
    }
}

/// Run the collected done-hooks against a result.
///
/// Hooks arrive in registration (plugin-list) order and run reversed, each
/// observing the result as left by the one before it. A single response is
/// handed to every registered `on_next` once; a stream is wrapped so the
/// mutators run per item and the end callbacks fire exactly once.
pub(crate) fn apply_done_hooks(
    hooks: Vec<OnDone>,
    mut result: ExecutionResult,
    context: &SharedContext,
) -> ExecutionResult {
    let mut on_next: Vec<OnNext> = Vec::new();
    let mut on_end: Vec<OnEnd> = Vec::new();

    for hook in hooks.into_iter().rev() {
        let mut cx = DoneContext::new(&mut result, context);
        if let Some(handlers) = hook(&mut cx) {
            if let Some(next) = handlers.on_next {
                on_next.push(next);
            }
            if let Some(end) = handlers.on_end {
                on_end.push(end);
            }
        }
    }

    match result {
        ExecutionResult::Single(mut response) => {
            for next in &mut on_next {
                next(&mut response);
            }
            ExecutionResult::Single(response)
        }
        ExecutionResult::Stream(stream) if !(on_next.is_empty() && on_end.is_empty()) => {
            ExecutionResult::Stream(Box::pin(InterceptedStream::new(stream, on_next, on_end)))
        }
        other => other,
    }
}
