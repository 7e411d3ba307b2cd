use std::fmt;
use std::num::ParseIntError;

/// A 16-byte value identifying an entire trace.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// The invalid trace id (all zeroes).
    pub const INVALID: TraceId = TraceId(0);

    /// Construct a trace id from its big-endian byte representation.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// The big-endian byte representation of this trace id.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Parse a trace id from its lowercase hex representation.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u128::from_str_radix(hex, 16).map(TraceId)
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value identifying a span within a trace.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// The invalid span id (all zeroes).
    pub const INVALID: SpanId = SpanId(0);

    /// Construct a span id from its big-endian byte representation.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// The big-endian byte representation of this span id.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Parse a span id from its lowercase hex representation.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u64::from_str_radix(hex, 16).map(SpanId)
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Flags carried with a [`TraceContext`].
///
/// The only defined bit is `SAMPLED`; it propagates the local sampling
/// decision downstream so child services can follow it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// No flags set.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);
    /// The call was chosen for recording.
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct flags from their byte representation.
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Returns `true` if the sampled flag is set.
    pub fn is_sampled(&self) -> bool {
        self.0 & TraceFlags::SAMPLED.0 == TraceFlags::SAMPLED.0
    }

    /// Returns a copy of these flags with the sampled bit set to
    /// `sampled`.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            TraceFlags(self.0 | TraceFlags::SAMPLED.0)
        } else {
            TraceFlags(self.0 & !TraceFlags::SAMPLED.0)
        }
    }

    /// The byte representation of these flags.
    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

impl fmt::LowerHex for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The portion of a span that must propagate to downstream services:
/// its position in the trace and the sampling decision.
///
/// Produced by a [`SpanFactory`](crate::SpanFactory) and consumed by
/// [`ContextInjector`](crate::ContextInjector)s. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: SpanId,
    trace_flags: TraceFlags,
}

impl TraceContext {
    /// Construct a trace context from its parts.
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: SpanId,
        trace_flags: TraceFlags,
    ) -> Self {
        TraceContext {
            trace_id,
            span_id,
            parent_span_id,
            trace_flags,
        }
    }

    /// The id of the trace this span belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The id of this span.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The id of this span's parent, or [`SpanId::INVALID`] for a trace
    /// root.
    pub fn parent_span_id(&self) -> SpanId {
        self.parent_span_id
    }

    /// The flags carried with this context.
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Returns `true` if this call was chosen for recording.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// Returns `true` if both the trace id and span id are non-zero.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }
}
