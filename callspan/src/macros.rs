//! Internal diagnostics macros.
//!
//! These are for anomalies inside the instrumentation itself (a span
//! finished by its drop glue, a poisoned reporter lock), never for
//! application logging. They forward to the `tracing` crate when the
//! `internal-logs` feature is enabled and compile to nothing otherwise.

macro_rules! diag_debug {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        #[cfg(feature = "internal-logs")]
        {
            ::tracing::debug!(target: env!("CARGO_PKG_NAME"), name = $name $(, $key = $value)*);
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name $(, &$value)*);
        }
    }};
}

macro_rules! diag_warn {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        #[cfg(feature = "internal-logs")]
        {
            ::tracing::warn!(target: env!("CARGO_PKG_NAME"), name = $name $(, $key = $value)*);
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name $(, &$value)*);
        }
    }};
}

pub(crate) use diag_debug;
pub(crate) use diag_warn;
