//! The two-phase client call lifecycle.
//!
//! [`ClientHandler::handle_send`] runs before the request leaves the
//! process; [`ClientHandler::handle_receive`] runs exactly once when the
//! outcome is known. Everything type-specific lives in the
//! [`RequestAdapter`] and [`ResponseAdapter`] capability traits.
mod adapter;
mod handler;

pub use adapter::{RequestAdapter, ResponseAdapter};
pub use handler::{resolve_remote_endpoint, ClientHandler, ClientHandlerBuilder, InFlightSpan};

/// Tag key carrying the error description of a failed call.
pub const ERROR_TAG: &str = "error";
