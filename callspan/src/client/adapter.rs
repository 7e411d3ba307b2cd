use std::borrow::Cow;
use std::error::Error;

use crate::trace::{EndpointBuilder, Span};

/// Reads span-relevant information off a native request type.
///
/// Implementations bridge one concrete client library to the call
/// handler. Every method is a pure read plus tag writes; none should
/// block or perform I/O, and all of them run only for sampled calls.
pub trait RequestAdapter {
    /// The native request type of the instrumented client.
    type Request;
    /// The native response type of the instrumented client.
    type Response;

    /// A low-cardinality, human-readable name for the span, such as the
    /// request method.
    fn span_name(&self, request: &Self::Request) -> Cow<'static, str>;

    /// Writes request-derived tags onto the span before the call is
    /// sent.
    fn request_tags(&self, request: &Self::Request, span: &mut Span) {
        let _ = (request, span);
    }

    /// Attempts to populate the remote endpoint from the request.
    ///
    /// Returns `true` when the request yielded endpoint details. Returning
    /// `false` with no statically configured server name means no
    /// endpoint is attached at all.
    fn resolve_endpoint(&self, request: &Self::Request, endpoint: &mut EndpointBuilder) -> bool {
        let _ = (request, endpoint);
        false
    }

    /// Produces the error description for a completed call, from the
    /// response and/or the error.
    ///
    /// Both can be present at once (a transport failure on a partially
    /// received response); the error is the stronger signal. The default
    /// implementation describes the error and ignores the response.
    fn describe_error(
        &self,
        response: Option<&Self::Response>,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<String> {
        let _ = response;
        error.map(|error| error.to_string())
    }
}

/// Reads span-relevant information off a native response type.
pub trait ResponseAdapter {
    /// The native response type of the instrumented client.
    type Response;

    /// Writes response-derived tags onto the span after the call
    /// completed.
    fn response_tags(&self, response: &Self::Response, span: &mut Span) {
        let _ = (response, span);
    }
}
