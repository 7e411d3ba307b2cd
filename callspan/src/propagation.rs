//! Interfaces for writing trace context onto outgoing calls.
//!
//! A [`ContextInjector`] knows how to serialize a [`TraceContext`] onto a
//! carrier of some concrete type; the wire format is the injector's
//! business, not this crate's. For the common text-map case, carriers
//! expose the [`Injector`] write interface so one injector
//! implementation can serve any string key/value carrier.
use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::BuildHasher;

use thiserror::Error;

use crate::trace::TraceContext;

/// Interface for adding string fields to an underlying carrier such as a
/// `HashMap` or a header map.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

impl<S: BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the `HashMap`.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

/// Writes the propagation fields of a [`TraceContext`] onto a carrier.
///
/// Implementations define the field names and encoding; the call handler
/// only guarantees *when* injection happens: before the request leaves,
/// for every call, sampled or not.
pub trait ContextInjector<C> {
    /// Write `context`'s propagation fields onto `carrier`.
    ///
    /// Must not fail for a well-formed carrier. A failure is surfaced to
    /// the caller of `handle_send` unaltered, since silently dropping
    /// propagation would break the downstream trace.
    fn inject(&self, context: &TraceContext, carrier: &mut C) -> Result<(), PropagationError>;
}

/// Error returned when trace context cannot be written to a carrier.
#[derive(Debug, Error)]
#[error("cannot inject trace context into carrier: {message}")]
pub struct PropagationError {
    message: Cow<'static, str>,
}

impl PropagationError {
    /// Creates an injection error with the given cause description.
    pub fn inject(message: impl Into<Cow<'static, str>>) -> Self {
        PropagationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_map_set_lowercases_keys() {
        let mut carrier = HashMap::new();
        carrier.set("headerName", "value".to_string());

        assert_eq!(carrier.get("headername"), Some(&"value".to_string()));
    }

    #[test]
    fn hash_map_set_overwrites() {
        let mut carrier = HashMap::new();
        carrier.set("key", "one".to_string());
        carrier.set("KEY", "two".to_string());

        assert_eq!(carrier.len(), 1);
        assert_eq!(carrier.get("key"), Some(&"two".to_string()));
    }

    #[test]
    fn propagation_error_display() {
        let err = PropagationError::inject("carrier is read-only");
        assert_eq!(
            err.to_string(),
            "cannot inject trace context into carrier: carrier is read-only"
        );
    }
}
