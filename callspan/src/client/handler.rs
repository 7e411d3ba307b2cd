use std::error::Error;

use crate::propagation::{ContextInjector, PropagationError};
use crate::trace::{Endpoint, Span, SpanFactory, SpanKind, TraceContext};
use crate::Context;

use super::adapter::{RequestAdapter, ResponseAdapter};
use super::ERROR_TAG;

/// Standardizes the way outbound calls are traced from the client side.
///
/// One logical call is two handler calls: [`handle_send`] before the
/// request goes on the wire, [`handle_receive`] once the outcome is
/// known. The handler never makes the call itself and holds nothing
/// across it.
///
/// ```text
/// let span = handler.handle_send(&injector, &mut request)?;
/// let _guard = Context::current_with_span_context(span.context().clone()).attach();
/// let outcome = invoke(request); // downstream code sees the current context
/// handler.handle_receive(outcome.response(), outcome.error(), span);
/// ```
///
/// [`handle_send`]: ClientHandler::handle_send
/// [`handle_receive`]: ClientHandler::handle_receive
#[derive(Debug)]
pub struct ClientHandler<A, P> {
    span_factory: Box<dyn SpanFactory>,
    request_adapter: A,
    response_adapter: P,
    server_name: Option<String>,
}

impl<A, P> ClientHandler<A, P>
where
    A: RequestAdapter,
    P: ResponseAdapter<Response = A::Response>,
{
    /// Starts building a handler from a span factory and the adapters
    /// for the instrumented client's types.
    pub fn builder(
        span_factory: impl SpanFactory + 'static,
        request_adapter: A,
        response_adapter: P,
    ) -> ClientHandlerBuilder<A, P> {
        ClientHandlerBuilder {
            span_factory: Box::new(span_factory),
            request_adapter,
            response_adapter,
            server_name: None,
        }
    }

    /// Starts the client span and injects its trace context onto the
    /// request, which doubles as the carrier.
    ///
    /// Call this before sending the request on the wire.
    pub fn handle_send<I>(
        &self,
        injector: &I,
        request: &mut A::Request,
    ) -> Result<InFlightSpan, PropagationError>
    where
        I: ContextInjector<A::Request> + ?Sized,
    {
        let mut span = self.span_factory.next_span(&Context::current());
        if let Err(err) = injector.inject(span.context(), request) {
            span.abandon();
            return Err(err);
        }
        Ok(self.start_span(span, request))
    }

    /// Like [`handle_send`](ClientHandler::handle_send), except for when
    /// the carrier of trace context is not the request itself.
    pub fn handle_send_with_carrier<I, C>(
        &self,
        injector: &I,
        carrier: &mut C,
        request: &A::Request,
    ) -> Result<InFlightSpan, PropagationError>
    where
        I: ContextInjector<C> + ?Sized,
    {
        let mut span = self.span_factory.next_span(&Context::current());
        if let Err(err) = injector.inject(span.context(), carrier) {
            span.abandon();
            return Err(err);
        }
        Ok(self.start_span(span, request))
    }

    fn start_span(&self, mut span: Span, request: &A::Request) -> InFlightSpan {
        if span.is_noop() {
            return InFlightSpan { span };
        }

        // All parsing happens before the timestamp is recorded, so the
        // span duration covers only the network-visible part of the call.
        span.set_kind(SpanKind::Client);
        span.update_name(self.request_adapter.span_name(request));
        self.request_adapter.request_tags(request, &mut span);
        if let Some(remote_endpoint) = resolve_remote_endpoint(
            &self.request_adapter,
            request,
            self.server_name.as_deref(),
        ) {
            span.set_remote_endpoint(remote_endpoint);
        }
        span.start();

        InFlightSpan { span }
    }

    /// Finishes the client span after tagging it according to the
    /// response and/or error.
    ///
    /// Call this once the outcome is known. Both `response` and `error`
    /// may be absent (the call never produced either); the span still
    /// finishes. A panic in an adapter propagates to the caller, but only
    /// after the span has been finished and reported.
    pub fn handle_receive(
        &self,
        response: Option<&A::Response>,
        error: Option<&(dyn Error + 'static)>,
        span: InFlightSpan,
    ) {
        let mut span = span.span;
        if span.is_noop() {
            return;
        }

        // `span` finishes on every exit path from here on: explicitly
        // below, or through its drop glue if an adapter panics.
        if response.is_some() || error.is_some() {
            if let Some(message) = self.request_adapter.describe_error(response, error) {
                if !message.is_empty() {
                    span.tag(ERROR_TAG, message);
                }
            }
        }
        if let Some(response) = response {
            self.response_adapter.response_tags(response, &mut span);
        }
        span.finish();
    }
}

/// Builder for [`ClientHandler`].
#[derive(Debug)]
pub struct ClientHandlerBuilder<A, P> {
    span_factory: Box<dyn SpanFactory>,
    request_adapter: A,
    response_adapter: P,
    server_name: Option<String>,
}

impl<A, P> ClientHandlerBuilder<A, P>
where
    A: RequestAdapter,
    P: ResponseAdapter<Response = A::Response>,
{
    /// Sets the statically configured name of the remote service.
    ///
    /// Used as the endpoint service name when the request adapter cannot
    /// supply one. An empty string means unset.
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        let server_name = server_name.into();
        self.server_name = if server_name.is_empty() {
            None
        } else {
            Some(server_name)
        };
        self
    }

    /// Builds the configured handler.
    pub fn build(self) -> ClientHandler<A, P> {
        ClientHandler {
            span_factory: self.span_factory,
            request_adapter: self.request_adapter,
            response_adapter: self.response_adapter,
            server_name: self.server_name,
        }
    }
}

/// A span between `handle_send` and `handle_receive`.
///
/// Only [`ClientHandler::handle_receive`] can consume it, so a second
/// finish is unrepresentable. Dropping it without calling
/// `handle_receive` finishes the span with the state recorded at send
/// time; calling `handle_receive` remains the caller's obligation if
/// outcome tags are wanted.
#[derive(Debug)]
pub struct InFlightSpan {
    span: Span,
}

impl InFlightSpan {
    /// The trace context identifying this call's span.
    pub fn context(&self) -> &TraceContext {
        self.span.context()
    }

    /// Returns `true` if sampling dropped this call.
    pub fn is_noop(&self) -> bool {
        self.span.is_noop()
    }

    /// Sets a caller-supplied tag on the in-flight span.
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.span.tag(key, value);
    }
}

/// Decides the remote endpoint for a span from what the adapter can read
/// off the request and the statically configured server name.
///
/// The adapter's resolved network details always win; the static name is
/// only the fallback service name when the adapter supplied none. When
/// the adapter fails and no name is configured, no endpoint is produced
/// at all; a blank service name on every span would be worse than none.
pub fn resolve_remote_endpoint<A>(
    adapter: &A,
    request: &A::Request,
    server_name: Option<&str>,
) -> Option<Endpoint>
where
    A: RequestAdapter + ?Sized,
{
    let mut endpoint = Endpoint::builder();
    let resolved = adapter.resolve_endpoint(request, &mut endpoint);
    if !resolved && server_name.is_none() {
        return None;
    }
    if !endpoint.has_service_name() {
        if let Some(server_name) = server_name {
            endpoint.service_name(server_name);
        }
    }
    Some(endpoint.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::EndpointBuilder;
    use std::borrow::Cow;
    use std::net::{IpAddr, Ipv4Addr};

    const ADAPTER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9));

    struct StubAdapter {
        resolves: bool,
        supplies_name: bool,
    }

    impl RequestAdapter for StubAdapter {
        type Request = ();
        type Response = ();

        fn span_name(&self, _request: &()) -> Cow<'static, str> {
            "call".into()
        }

        fn resolve_endpoint(&self, _request: &(), endpoint: &mut EndpointBuilder) -> bool {
            if !self.resolves {
                return false;
            }
            endpoint.address(ADAPTER_IP).port(9000);
            if self.supplies_name {
                endpoint.service_name("adapter-svc");
            }
            true
        }
    }

    #[test]
    fn adapter_resolves_and_no_static_name() {
        let adapter = StubAdapter {
            resolves: true,
            supplies_name: false,
        };
        let endpoint = resolve_remote_endpoint(&adapter, &(), None).unwrap();
        assert_eq!(endpoint.service_name(), None);
        assert_eq!(endpoint.address(), Some(ADAPTER_IP));
        assert_eq!(endpoint.port(), Some(9000));
    }

    #[test]
    fn adapter_fails_and_static_name_set() {
        let adapter = StubAdapter {
            resolves: false,
            supplies_name: false,
        };
        let endpoint = resolve_remote_endpoint(&adapter, &(), Some("configured-svc")).unwrap();
        assert_eq!(endpoint.service_name(), Some("configured-svc"));
        assert_eq!(endpoint.address(), None);
        assert_eq!(endpoint.port(), None);
    }

    #[test]
    fn adapter_fails_and_no_static_name() {
        let adapter = StubAdapter {
            resolves: false,
            supplies_name: false,
        };
        assert!(resolve_remote_endpoint(&adapter, &(), None).is_none());
    }

    #[test]
    fn static_name_is_fallback_not_override() {
        let adapter = StubAdapter {
            resolves: true,
            supplies_name: true,
        };
        let endpoint = resolve_remote_endpoint(&adapter, &(), Some("configured-svc")).unwrap();
        assert_eq!(endpoint.service_name(), Some("adapter-svc"));
        assert_eq!(endpoint.address(), Some(ADAPTER_IP));
    }

    #[test]
    fn static_name_fills_gap_when_adapter_resolves_without_name() {
        let adapter = StubAdapter {
            resolves: true,
            supplies_name: false,
        };
        let endpoint = resolve_remote_endpoint(&adapter, &(), Some("configured-svc")).unwrap();
        assert_eq!(endpoint.service_name(), Some("configured-svc"));
        assert_eq!(endpoint.address(), Some(ADAPTER_IP));
    }
}
