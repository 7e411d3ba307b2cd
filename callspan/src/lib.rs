//! Client-side span lifecycle instrumentation for outbound
//! request/response calls.
//!
//! `callspan` standardizes the way an outbound call (an HTTP request, an
//! RPC, a queue publish with a reply) is traced from the client side: one
//! span per logical call, named and tagged before the call leaves the
//! process, finished exactly once when the outcome is known, with trace
//! context propagated onto the outgoing call so the downstream service
//! can continue the same trace.
//!
//! The lifecycle is an explicit two-phase contract on [`ClientHandler`]:
//!
//! * [`ClientHandler::handle_send`] allocates a span parented on the
//!   ambient [`Context`], injects its trace context onto the carrier
//!   (always, even when sampling dropped the call), applies pre-send
//!   names and tags, and returns an [`InFlightSpan`].
//! * [`ClientHandler::handle_receive`] consumes the [`InFlightSpan`]
//!   with the response and/or error, applies outcome tags, and finishes
//!   the span, handing it to the configured [`SpanReporter`].
//!
//! Everything the handler needs to know about concrete request and
//! response types comes from the [`RequestAdapter`] and
//! [`ResponseAdapter`] capability traits; how trace context is written
//! to a carrier comes from a [`ContextInjector`]; whether a call is
//! sampled comes from the [`SpanFactory`] (usually a [`Tracer`] with a
//! [`Sampler`]). None of these perform I/O inside the handler.
//!
//! # Examples
//!
//! ```
//! use std::borrow::Cow;
//! use std::collections::HashMap;
//!
//! use callspan::{
//!     ClientHandler, Context, ContextInjector, InMemorySpanReporter, Injector,
//!     PropagationError, RequestAdapter, ResponseAdapter, Sampler, Span,
//!     TraceContext, Tracer,
//! };
//!
//! // The native request/response types of the client being instrumented.
//! struct Request {
//!     path: &'static str,
//! }
//! struct Response {
//!     status: u16,
//! }
//!
//! struct Adapter;
//!
//! impl RequestAdapter for Adapter {
//!     type Request = Request;
//!     type Response = Response;
//!
//!     fn span_name(&self, _request: &Request) -> Cow<'static, str> {
//!         "get".into()
//!     }
//!
//!     fn request_tags(&self, request: &Request, span: &mut Span) {
//!         span.tag("http.path", request.path);
//!     }
//! }
//!
//! impl ResponseAdapter for Adapter {
//!     type Response = Response;
//!
//!     fn response_tags(&self, response: &Response, span: &mut Span) {
//!         span.tag("http.status_code", response.status.to_string());
//!     }
//! }
//!
//! // Writes propagation fields onto a text-map carrier.
//! struct FieldInjector;
//!
//! impl ContextInjector<HashMap<String, String>> for FieldInjector {
//!     fn inject(
//!         &self,
//!         context: &TraceContext,
//!         carrier: &mut HashMap<String, String>,
//!     ) -> Result<(), PropagationError> {
//!         carrier.set("trace-id", context.trace_id().to_string());
//!         carrier.set("span-id", context.span_id().to_string());
//!         Ok(())
//!     }
//! }
//!
//! let reporter = InMemorySpanReporter::default();
//! let tracer = Tracer::builder()
//!     .with_sampler(Sampler::AlwaysOn)
//!     .with_reporter(reporter.clone())
//!     .build();
//! let handler = ClientHandler::builder(tracer, Adapter, Adapter).build();
//!
//! let request = Request { path: "/users" };
//! let mut carrier = HashMap::new();
//! let span = handler
//!     .handle_send_with_carrier(&FieldInjector, &mut carrier, &request)
//!     .unwrap();
//!
//! // Downstream code sees the span as the current trace context.
//! let _guard = Context::current_with_span_context(span.context().clone()).attach();
//!
//! let response = Response { status: 200 };
//! handler.handle_receive(Some(&response), None, span);
//!
//! let spans = reporter.finished_spans();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].name, "get");
//! assert_eq!(spans[0].tags["http.status_code"], "200");
//! assert!(carrier.contains_key("trace-id"));
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod context;
#[cfg(feature = "futures")]
mod future_ext;
mod macros;

pub mod client;
pub mod propagation;
pub mod trace;

pub use context::{Context, ContextGuard};
#[cfg(feature = "futures")]
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
pub use future_ext::{FutureContextExt, WithContext};

pub use client::{
    resolve_remote_endpoint, ClientHandler, ClientHandlerBuilder, InFlightSpan, RequestAdapter,
    ResponseAdapter, ERROR_TAG,
};
pub use propagation::{ContextInjector, Injector, PropagationError};
#[cfg(any(test, feature = "testing"))]
pub use trace::IncrementIdGenerator;
pub use trace::{
    Endpoint, EndpointBuilder, IdGenerator, InMemorySpanReporter, NoopSpanReporter,
    RandomIdGenerator, Sampler, SamplingDecision, ShouldSample, Span, SpanData, SpanFactory,
    SpanId, SpanKind, SpanReporter, TraceContext, TraceFlags, TraceId, Tracer, TracerBuilder,
};
