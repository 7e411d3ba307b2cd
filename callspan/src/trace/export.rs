//! The seam between finished spans and whatever exports them.
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::macros::diag_warn;

use super::{Endpoint, SpanKind, TraceContext};

/// The immutable record of a finished span.
///
/// Produced exactly once per recorded call, when the span finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// The span's position in its trace.
    pub context: TraceContext,
    /// The span kind.
    pub kind: SpanKind,
    /// The span name.
    pub name: Cow<'static, str>,
    /// Tags attached before and after the call.
    pub tags: HashMap<String, String>,
    /// The resolved remote endpoint, when one could be determined.
    pub remote_endpoint: Option<Endpoint>,
    /// When the call left the process.
    pub start_time: SystemTime,
    /// When the outcome was known.
    pub end_time: SystemTime,
}

/// Receives finished spans.
///
/// Buffering, batching, and exporting are the implementation's business;
/// the call handler only guarantees it delivers each recorded span
/// exactly once. `report` runs on the calling thread and should return
/// quickly.
pub trait SpanReporter: fmt::Debug + Send + Sync {
    /// Accept a finished span.
    fn report(&self, span: SpanData);
}

/// A reporter that discards every span.
#[derive(Clone, Debug, Default)]
pub struct NoopSpanReporter {
    _private: (),
}

impl NoopSpanReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        NoopSpanReporter::default()
    }
}

impl SpanReporter for NoopSpanReporter {
    fn report(&self, _span: SpanData) {}
}

/// A reporter that stores finished spans in memory.
///
/// Useful for tests and local debugging. Clones share the same storage,
/// so keep one clone to inspect what the instrumented code produced.
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanReporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanReporter {
    /// Create a new, empty in-memory reporter.
    pub fn new() -> Self {
        InMemorySpanReporter::default()
    }

    /// Returns the spans finished so far.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_else(|_| {
                diag_warn!(name: "InMemorySpanReporter.LockPoisoned");
                Vec::new()
            })
    }

    /// Clears the stored spans.
    pub fn reset(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

impl SpanReporter for InMemorySpanReporter {
    fn report(&self, span: SpanData) {
        match self.spans.lock() {
            Ok(mut spans) => spans.push(span),
            Err(_) => diag_warn!(name: "InMemorySpanReporter.LockPoisoned"),
        }
    }
}
