//! [`http`] crate integration for `callspan`.
//!
//! Provides a header-map carrier for context injection and default
//! request/response adapters for `http::Request` / `http::Response`, so
//! any client built on the `http` types can be instrumented without
//! writing its own adapter.
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::net::IpAddr;

use callspan::{EndpointBuilder, Injector, RequestAdapter, ResponseAdapter, Span};

/// Helper for injecting context fields into HTTP requests.
///
/// Wraps a mutable header map as an [`Injector`] carrier.
pub struct HeaderInjector<'a>(pub &'a mut http::HeaderMap);

impl Injector for HeaderInjector<'_> {
    /// Set a key and value in the `HeaderMap`. Does nothing if the key or
    /// value are not valid inputs.
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = http::header::HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(val) = http::header::HeaderValue::from_str(&value) {
                self.0.insert(name, val);
            }
        }
    }
}

/// Default client adapter for `http::Request<B>` / `http::Response<R>`.
///
/// Span names come from the request method; request tags carry the
/// method and path; the remote endpoint resolves from the URI authority
/// when its host is an IP literal (no DNS lookups happen here); response
/// tags carry the status code; the error description is the supplied
/// error, or the status code of a 4xx/5xx response when no error is
/// present.
pub struct HttpAdapter<B = (), R = ()> {
    _marker: PhantomData<fn(B, R)>,
}

impl<B, R> HttpAdapter<B, R> {
    /// Create a new adapter.
    pub fn new() -> Self {
        HttpAdapter {
            _marker: PhantomData,
        }
    }
}

impl<B, R> Default for HttpAdapter<B, R> {
    fn default() -> Self {
        HttpAdapter::new()
    }
}

impl<B, R> Clone for HttpAdapter<B, R> {
    fn clone(&self) -> Self {
        HttpAdapter::new()
    }
}

impl<B, R> Copy for HttpAdapter<B, R> {}

impl<B, R> fmt::Debug for HttpAdapter<B, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAdapter").finish()
    }
}

impl<B, R> RequestAdapter for HttpAdapter<B, R> {
    type Request = http::Request<B>;
    type Response = http::Response<R>;

    fn span_name(&self, request: &Self::Request) -> Cow<'static, str> {
        request.method().as_str().to_owned().into()
    }

    fn request_tags(&self, request: &Self::Request, span: &mut Span) {
        span.tag("http.method", request.method().as_str());
        span.tag("http.path", request.uri().path());
    }

    fn resolve_endpoint(&self, request: &Self::Request, endpoint: &mut EndpointBuilder) -> bool {
        let authority = match request.uri().authority() {
            Some(authority) => authority,
            None => return false,
        };
        // IPv6 hosts come bracketed in the authority.
        let host = authority
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']');
        let address: IpAddr = match host.parse() {
            Ok(address) => address,
            Err(_) => return false,
        };

        endpoint.address(address);
        if let Some(port) = authority.port_u16() {
            endpoint.port(port);
        }
        true
    }

    fn describe_error(
        &self,
        response: Option<&Self::Response>,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<String> {
        if let Some(error) = error {
            return Some(error.to_string());
        }
        response.and_then(|response| {
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                Some(status.as_u16().to_string())
            } else {
                None
            }
        })
    }
}

impl<B, R> ResponseAdapter for HttpAdapter<B, R> {
    type Response = http::Response<R>;

    fn response_tags(&self, response: &Self::Response, span: &mut Span) {
        span.tag("http.status_code", response.status().as_u16().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callspan::{Context, InMemorySpanReporter, Sampler, SpanData, SpanFactory, Tracer};
    use std::net::Ipv6Addr;

    fn adapter() -> HttpAdapter {
        HttpAdapter::new()
    }

    fn request(uri: &str) -> http::Request<()> {
        http::Request::builder()
            .method("GET")
            .uri(uri)
            .body(())
            .unwrap()
    }

    fn response(status: u16) -> http::Response<()> {
        http::Response::builder().status(status).body(()).unwrap()
    }

    /// Runs span mutations through a recording span and returns what was
    /// reported.
    fn record(f: impl FnOnce(&mut Span)) -> SpanData {
        let reporter = InMemorySpanReporter::new();
        let tracer = Tracer::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_reporter(reporter.clone())
            .build();
        let mut span = tracer.next_span(&Context::new());
        f(&mut span);
        span.finish();
        reporter.finished_spans().remove(0)
    }

    #[test]
    fn header_injector_set() {
        let mut carrier = http::HeaderMap::new();
        HeaderInjector(&mut carrier).set("headerName", "value".to_string());

        assert_eq!(carrier.get("headername").unwrap(), "value");
    }

    #[test]
    fn header_injector_ignores_invalid_input() {
        let mut carrier = http::HeaderMap::new();
        HeaderInjector(&mut carrier).set("bad header", "value".to_string());
        HeaderInjector(&mut carrier).set("name", "bad\nvalue".to_string());

        assert!(carrier.is_empty());
    }

    #[test]
    fn span_name_is_the_method() {
        assert_eq!(adapter().span_name(&request("http://example.com/")), "GET");
    }

    #[test]
    fn request_tags_carry_method_and_path() {
        let request = request("http://example.com/users?page=2");
        let span = record(|span| adapter().request_tags(&request, span));

        assert_eq!(span.tags["http.method"], "GET");
        assert_eq!(span.tags["http.path"], "/users");
    }

    #[test]
    fn endpoint_resolves_from_ip_authority() {
        let request = request("http://127.0.0.1:8080/users");
        let mut endpoint = EndpointBuilder::default();

        assert!(adapter().resolve_endpoint(&request, &mut endpoint));
        let endpoint = endpoint.build();
        assert_eq!(endpoint.address(), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(endpoint.port(), Some(8080));
    }

    #[test]
    fn endpoint_resolves_bracketed_ipv6() {
        let request = request("http://[::1]:9411/api");
        let mut endpoint = EndpointBuilder::default();

        assert!(adapter().resolve_endpoint(&request, &mut endpoint));
        assert_eq!(
            endpoint.build().address(),
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
    }

    #[test]
    fn endpoint_resolution_fails_for_hostnames() {
        // Hostnames would need a DNS lookup, which this adapter never does.
        let request = request("http://example.com/users");
        let mut endpoint = EndpointBuilder::default();

        assert!(!adapter().resolve_endpoint(&request, &mut endpoint));
    }

    #[test]
    fn describe_error_prefers_the_error() {
        let response = response(500);
        let error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");

        let described = adapter().describe_error(Some(&response), Some(&error));
        assert_eq!(described, Some("connection reset".to_string()));
    }

    #[test]
    fn describe_error_uses_failure_status() {
        let response = response(503);
        assert_eq!(
            adapter().describe_error(Some(&response), None),
            Some("503".to_string())
        );
    }

    #[test]
    fn describe_error_is_silent_on_success() {
        let response = response(204);
        assert_eq!(adapter().describe_error(Some(&response), None), None);
        assert_eq!(adapter().describe_error(None, None), None);
    }

    #[test]
    fn response_tags_carry_status() {
        let response = response(201);
        let span = record(|span| adapter().response_tags(&response, span));

        assert_eq!(span.tags["http.status_code"], "201");
    }
}
