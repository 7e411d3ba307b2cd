use std::pin::Pin;
use std::task::Context as TaskContext;
use std::task::Poll;

use pin_project_lite::pin_project;

use crate::Context;

pin_project! {
    /// A future with an associated [`Context`].
    ///
    /// The stored context is attached as current for the duration of
    /// every poll, so spawned or suspended work parents its spans the
    /// same way the originating scope would.
    #[derive(Clone, Debug)]
    pub struct WithContext<T> {
        #[pin]
        inner: T,
        cx: Context,
    }
}

impl<T: std::future::Future> std::future::Future for WithContext<T> {
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = this.cx.clone().attach();

        this.inner.poll(task_cx)
    }
}

impl<F: std::future::Future> FutureContextExt for F {}

/// Extension trait carrying the ambient [`Context`] across `await` points.
pub trait FutureContextExt: Sized {
    /// Attaches the provided [`Context`] to this future, returning a
    /// [`WithContext`] wrapper.
    ///
    /// The attached context is set as current while the future is being
    /// polled.
    fn with_context(self, cx: Context) -> WithContext<Self> {
        WithContext { inner: self, cx }
    }

    /// Attaches the current [`Context`] to this future, returning a
    /// [`WithContext`] wrapper.
    fn with_current_context(self) -> WithContext<Self> {
        let cx = Context::current();
        self.with_context(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{SpanId, TraceContext, TraceFlags, TraceId};

    #[test]
    fn context_is_current_while_polling() {
        let span_context = TraceContext::new(
            TraceId::from(7),
            SpanId::from(7),
            SpanId::INVALID,
            TraceFlags::SAMPLED,
        );
        let cx = Context::new().with_span_context(span_context.clone());

        let observed = futures_executor::block_on(
            async { Context::current().span_context().cloned() }.with_context(cx),
        );

        assert_eq!(observed, Some(span_context));
        assert!(Context::current().span_context().is_none());
    }
}
