//! Execution-scoped propagation of the current trace context.
//!
//! A [`Context`] is an immutable snapshot of "the trace context new spans
//! should be parented on". Contexts are associated with the current
//! execution unit via [`Context::attach`], which returns a guard that
//! restores the previous context when dropped, so scopes nest naturally.
//! [`Context::current`] snapshots whatever is attached on the calling
//! thread.
use std::cell::RefCell;
use std::marker::PhantomData;

use crate::trace::TraceContext;

thread_local! {
    static CURRENT_CONTEXT: RefCell<Context> = RefCell::new(Context::default());
}

/// An execution-scoped, immutable carrier for the active trace context.
///
/// # Examples
///
/// ```
/// use callspan::{Context, SpanId, TraceContext, TraceFlags, TraceId};
///
/// let span_context = TraceContext::new(
///     TraceId::from(1),
///     SpanId::from(2),
///     SpanId::INVALID,
///     TraceFlags::SAMPLED,
/// );
///
/// assert!(Context::current().span_context().is_none());
/// {
///     let _guard = Context::current_with_span_context(span_context.clone()).attach();
///     assert_eq!(Context::current().span_context(), Some(&span_context));
/// }
/// // Restored when the guard drops.
/// assert!(Context::current().span_context().is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    span_context: Option<TraceContext>,
}

impl Context {
    /// Creates an empty `Context`.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a snapshot of the current thread's context.
    pub fn current() -> Self {
        Self::map_current(|cx| cx.clone())
    }

    /// Applies a function to the current context, returning its value.
    ///
    /// Avoids cloning the context when only a read is needed.
    pub fn map_current<T>(f: impl FnOnce(&Context) -> T) -> T {
        CURRENT_CONTEXT.with(|cx| f(&cx.borrow()))
    }

    /// Returns a clone of the current context with the given span context
    /// set as active.
    pub fn current_with_span_context(span_context: TraceContext) -> Self {
        Self::map_current(|cx| cx.with_span_context(span_context))
    }

    /// Returns a copy of this context with the given span context set as
    /// active.
    pub fn with_span_context(&self, span_context: TraceContext) -> Self {
        Context {
            span_context: Some(span_context),
        }
    }

    /// The active span context, if any.
    pub fn span_context(&self) -> Option<&TraceContext> {
        self.span_context.as_ref()
    }

    /// Returns `true` if a span context is active in this context.
    pub fn has_span_context(&self) -> bool {
        self.span_context.is_some()
    }

    /// Attaches this context as the current one for the calling thread.
    ///
    /// The previous context is restored when the returned guard drops.
    /// Guards must stay on the thread that created them; they are
    /// deliberately `!Send`.
    pub fn attach(self) -> ContextGuard {
        let previous_cx = CURRENT_CONTEXT
            .try_with(|current| current.replace(self))
            .ok();

        ContextGuard {
            previous_cx,
            _marker: PhantomData,
        }
    }
}

/// A guard that restores the previously attached [`Context`] on drop.
#[derive(Debug)]
pub struct ContextGuard {
    previous_cx: Option<Context>,
    // Ensures the guard cannot migrate to another thread.
    _marker: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(previous_cx) = self.previous_cx.take() {
            let _ = CURRENT_CONTEXT.try_with(|current| current.replace(previous_cx));
        }
    }
}
