//! The mutable handle for one observed call.
//!
//! A recording span accumulates its name, tags, and remote endpoint
//! until it is finished; finishing takes the accumulated record out of
//! the handle exactly once and hands it to the configured reporter. A
//! no-op span owns no record at all, so every mutation on it is inert:
//! disabling sampling costs a branch, nothing more.
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::macros::diag_debug;

use super::export::{SpanData, SpanReporter};
use super::{Endpoint, TraceContext};

/// How a span relates to its parent and children in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    /// The span describes a request to a remote service and does not end
    /// until the response is received.
    Client,
    /// The span covers server-side handling of a remote request.
    Server,
    /// The span describes the initiator of an asynchronous request.
    Producer,
    /// The span describes a handler of an asynchronous request.
    Consumer,
    /// Default. An operation internal to the application.
    Internal,
}

/// A timed, tagged record of one observed call.
///
/// Spans are created by a [`SpanFactory`](super::SpanFactory): either
/// recording (sampled) or no-op. The handle is owned by the call that
/// created it until it is finished; after that the record belongs to the
/// reporting pipeline and the handle is spent.
///
/// Dropping an unfinished recording span finishes it with the state
/// recorded so far. That makes "the span is finished exactly once"
/// structural: a panic inside a tag-producing collaborator unwinds
/// through the handle and still reports the span.
#[derive(Debug)]
pub struct Span {
    context: TraceContext,
    inner: Option<SpanInner>,
}

#[derive(Debug)]
struct SpanInner {
    data: Option<SpanRecord>,
    reporter: Arc<dyn SpanReporter>,
}

#[derive(Debug)]
struct SpanRecord {
    kind: SpanKind,
    name: Cow<'static, str>,
    tags: HashMap<String, String>,
    remote_endpoint: Option<Endpoint>,
    start_time: Option<SystemTime>,
}

impl Span {
    /// Creates a recording span that reports to `reporter` when
    /// finished.
    pub fn recording(context: TraceContext, reporter: Arc<dyn SpanReporter>) -> Self {
        Span {
            context,
            inner: Some(SpanInner {
                data: Some(SpanRecord {
                    kind: SpanKind::Internal,
                    name: Cow::Borrowed(""),
                    tags: HashMap::new(),
                    remote_endpoint: None,
                    start_time: None,
                }),
                reporter,
            }),
        }
    }

    /// Creates a no-op span.
    ///
    /// The context is still real, since it must be injected onto
    /// outgoing calls so the trace is not broken downstream, but nothing
    /// about the call is recorded locally.
    pub fn noop(context: TraceContext) -> Self {
        Span {
            context,
            inner: None,
        }
    }

    /// The trace context identifying this span.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// Returns `true` if this span records nothing.
    pub fn is_noop(&self) -> bool {
        self.inner.is_none()
    }

    /// Operate on the record if this span is recording and unfinished.
    fn with_data<T>(&mut self, f: impl FnOnce(&mut SpanRecord) -> T) -> Option<T> {
        self.inner
            .as_mut()
            .and_then(|inner| inner.data.as_mut().map(f))
    }

    /// Sets the span kind.
    pub fn set_kind(&mut self, kind: SpanKind) {
        self.with_data(|data| data.kind = kind);
    }

    /// Updates the span name.
    pub fn update_name(&mut self, name: impl Into<Cow<'static, str>>) {
        let name = name.into();
        self.with_data(|data| data.name = name);
    }

    /// Sets a tag, overwriting any previous value for the key.
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.with_data(|data| {
            data.tags.insert(key, value);
        });
    }

    /// Attaches the resolved remote endpoint.
    pub fn set_remote_endpoint(&mut self, endpoint: Endpoint) {
        self.with_data(|data| data.remote_endpoint = Some(endpoint));
    }

    /// Records the start timestamp. Only the first call takes effect.
    pub fn start(&mut self) {
        let now = SystemTime::now();
        self.with_data(|data| {
            data.start_time.get_or_insert(now);
        });
    }

    /// Finishes the span, recording the end timestamp and handing the
    /// record to the reporter.
    pub fn finish(mut self) {
        self.end(SystemTime::now());
    }

    /// Drops the record without reporting it. Used when propagation
    /// failed before the call was ever issued.
    pub(crate) fn abandon(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.data.take();
        }
    }

    fn end(&mut self, end_time: SystemTime) {
        if let Some(inner) = self.inner.as_mut() {
            if let Some(record) = inner.data.take() {
                inner.reporter.report(SpanData {
                    context: self.context.clone(),
                    kind: record.kind,
                    name: record.name,
                    tags: record.tags,
                    remote_endpoint: record.remote_endpoint,
                    start_time: record.start_time.unwrap_or(end_time),
                    end_time,
                });
            }
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if self
            .inner
            .as_ref()
            .is_some_and(|inner| inner.data.is_some())
        {
            diag_debug!(name: "Span.FinishedOnDrop");
        }
        self.end(SystemTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{InMemorySpanReporter, SpanId, TraceFlags, TraceId};
    use std::time::Duration;

    fn test_context() -> TraceContext {
        TraceContext::new(
            TraceId::from(0xaa),
            SpanId::from(0xbb),
            SpanId::INVALID,
            TraceFlags::SAMPLED,
        )
    }

    fn recording_span() -> (Span, InMemorySpanReporter) {
        let reporter = InMemorySpanReporter::default();
        let span = Span::recording(test_context(), Arc::new(reporter.clone()));
        (span, reporter)
    }

    #[test]
    fn finish_reports_record() {
        let (mut span, reporter) = recording_span();
        span.set_kind(SpanKind::Client);
        span.update_name("get");
        span.tag("http.path", "/users");
        span.start();
        span.finish();

        let spans = reporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Client);
        assert_eq!(spans[0].name, "get");
        assert_eq!(spans[0].tags["http.path"], "/users");
        assert!(spans[0].start_time <= spans[0].end_time);
    }

    #[test]
    fn drop_finishes_unfinished_span() {
        let (span, reporter) = recording_span();
        drop(span);
        assert_eq!(reporter.finished_spans().len(), 1);
    }

    #[test]
    fn noop_span_is_inert() {
        let mut span = Span::noop(test_context());
        assert!(span.is_noop());
        span.set_kind(SpanKind::Client);
        span.update_name("get");
        span.tag("k", "v");
        span.start();
        span.finish();
    }

    #[test]
    fn abandoned_span_is_not_reported() {
        let (mut span, reporter) = recording_span();
        span.abandon();
        drop(span);
        assert!(reporter.finished_spans().is_empty());
    }

    #[test]
    fn start_only_records_once() {
        let (mut span, reporter) = recording_span();
        span.start();
        std::thread::sleep(Duration::from_millis(5));
        let second_attempt = SystemTime::now();
        span.start();
        span.finish();

        let spans = reporter.finished_spans();
        assert!(spans[0].start_time < second_attempt);
    }

    #[test]
    fn finish_without_start_uses_end_time() {
        let (span, reporter) = recording_span();
        span.finish();

        let spans = reporter.finished_spans();
        assert_eq!(spans[0].start_time, spans[0].end_time);
    }
}
