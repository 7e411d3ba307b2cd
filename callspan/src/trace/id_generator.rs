//! Trace and span id allocation.
use std::cell::RefCell;
use std::fmt;

use rand::{rngs, Rng, SeedableRng};

use super::{SpanId, TraceId};

/// Interface for generating trace and span ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new `TraceId`.
    fn new_trace_id(&self) -> TraceId;

    /// Generate a new `SpanId`.
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Generates trace and span ids from a thread-local random number
/// generator.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        CURRENT_RNG.with(|rng| TraceId::from(rng.borrow_mut().gen::<u128>()))
    }

    fn new_span_id(&self) -> SpanId {
        CURRENT_RNG.with(|rng| SpanId::from(rng.borrow_mut().gen::<u64>()))
    }
}

thread_local! {
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_entropy());
}

#[cfg(any(test, feature = "testing"))]
mod increment {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::{IdGenerator, SpanId, TraceId};

    /// [`IdGenerator`] implementation that increments a counter for each
    /// new id, producing predictable ids for tests.
    #[derive(Clone, Debug)]
    pub struct IncrementIdGenerator(Arc<AtomicU64>);

    impl IncrementIdGenerator {
        /// Create a new [`IncrementIdGenerator`] starting at 1.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Default for IncrementIdGenerator {
        fn default() -> Self {
            Self(Arc::new(AtomicU64::new(1)))
        }
    }

    impl IdGenerator for IncrementIdGenerator {
        fn new_trace_id(&self) -> TraceId {
            TraceId::from(self.0.fetch_add(1, Ordering::SeqCst) as u128)
        }

        fn new_span_id(&self) -> SpanId {
            SpanId::from(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub use increment::IncrementIdGenerator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_valid() {
        let generator = RandomIdGenerator::default();
        assert_ne!(generator.new_trace_id(), TraceId::INVALID);
        assert_ne!(generator.new_span_id(), SpanId::INVALID);
    }

    #[test]
    fn random_ids_differ() {
        let generator = RandomIdGenerator::default();
        assert_ne!(generator.new_trace_id(), generator.new_trace_id());
        assert_ne!(generator.new_span_id(), generator.new_span_id());
    }

    #[test]
    fn increment_ids_are_sequential() {
        let generator = IncrementIdGenerator::new();
        assert_eq!(generator.new_trace_id(), TraceId::from(1));
        assert_eq!(generator.new_span_id(), SpanId::from(2));
        assert_eq!(generator.new_span_id(), SpanId::from(3));
    }
}
