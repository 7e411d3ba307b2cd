//! Span allocation: parenting, sampling, and reporter binding.
use std::fmt;
use std::sync::Arc;

use crate::Context;

use super::export::{NoopSpanReporter, SpanReporter};
use super::id_generator::{IdGenerator, RandomIdGenerator};
use super::sampler::{Sampler, SamplingDecision, ShouldSample};
use super::span::Span;
use super::span_context::{SpanId, TraceContext};

/// Creates the next span for an outbound call.
///
/// Pure allocation: implementations must not perform I/O. The span is
/// parented on whatever `cx` carries (a child of the active trace, or a
/// new root when nothing is active), and the implementation decides
/// whether it records or is a no-op.
pub trait SpanFactory: fmt::Debug + Send + Sync {
    /// Allocate a span bound to the given ambient context.
    fn next_span(&self, cx: &Context) -> Span;
}

impl<T: SpanFactory + ?Sized> SpanFactory for Arc<T> {
    fn next_span(&self, cx: &Context) -> Span {
        (**self).next_span(cx)
    }
}

/// The production [`SpanFactory`]: allocates ids, consults a sampler,
/// and binds recording spans to a reporter.
///
/// No-op spans still receive a fully valid trace context so propagation
/// keeps working when sampling drops a call.
#[derive(Debug)]
pub struct Tracer {
    sampler: Box<dyn ShouldSample>,
    id_generator: Box<dyn IdGenerator>,
    reporter: Arc<dyn SpanReporter>,
}

impl Tracer {
    /// Starts building a `Tracer`.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }
}

impl SpanFactory for Tracer {
    fn next_span(&self, cx: &Context) -> Span {
        let parent = cx.span_context().filter(|parent| parent.is_valid());
        let trace_id = parent
            .map(|parent| parent.trace_id())
            .unwrap_or_else(|| self.id_generator.new_trace_id());
        let parent_span_id = parent
            .map(|parent| parent.span_id())
            .unwrap_or(SpanId::INVALID);
        let span_id = self.id_generator.new_span_id();

        let sampled =
            self.sampler.should_sample(parent, trace_id) == SamplingDecision::RecordAndSample;
        let flags = parent
            .map(|parent| parent.trace_flags())
            .unwrap_or_default()
            .with_sampled(sampled);
        let context = TraceContext::new(trace_id, span_id, parent_span_id, flags);

        if sampled {
            Span::recording(context, Arc::clone(&self.reporter))
        } else {
            Span::noop(context)
        }
    }
}

/// Builder for [`Tracer`].
///
/// Defaults: parent-based always-on sampling, random ids, and a reporter
/// that discards everything.
#[derive(Debug)]
pub struct TracerBuilder {
    sampler: Box<dyn ShouldSample>,
    id_generator: Box<dyn IdGenerator>,
    reporter: Arc<dyn SpanReporter>,
}

impl Default for TracerBuilder {
    fn default() -> Self {
        TracerBuilder {
            sampler: Box::new(Sampler::ParentBased(Box::new(Sampler::AlwaysOn))),
            id_generator: Box::<RandomIdGenerator>::default(),
            reporter: Arc::new(NoopSpanReporter::new()),
        }
    }
}

impl TracerBuilder {
    /// Use the given sampler.
    pub fn with_sampler(mut self, sampler: impl ShouldSample + 'static) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Use the given id generator.
    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Deliver finished spans to the given reporter.
    pub fn with_reporter(mut self, reporter: impl SpanReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Builds the configured `Tracer`.
    pub fn build(self) -> Tracer {
        Tracer {
            sampler: self.sampler,
            id_generator: self.id_generator,
            reporter: self.reporter,
        }
    }
}
