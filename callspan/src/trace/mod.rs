//! Span handles, trace identifiers, and the collaborators that produce
//! and consume them.
mod endpoint;
mod export;
mod id_generator;
mod sampler;
mod span;
mod span_context;
mod tracer;

pub use endpoint::{Endpoint, EndpointBuilder};
pub use export::{InMemorySpanReporter, NoopSpanReporter, SpanData, SpanReporter};
#[cfg(any(test, feature = "testing"))]
pub use id_generator::IncrementIdGenerator;
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use sampler::{Sampler, SamplingDecision, ShouldSample};
pub use span::{Span, SpanKind};
pub use span_context::{SpanId, TraceContext, TraceFlags, TraceId};
pub use tracer::{SpanFactory, Tracer, TracerBuilder};
