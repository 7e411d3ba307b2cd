//! Sampling decisions for new spans.
use std::fmt;

use super::{TraceContext, TraceId};

/// The outcome of a sampling decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingDecision {
    /// The span will be a no-op: nothing recorded, nothing reported.
    Drop,
    /// The span records and is reported when finished.
    RecordAndSample,
}

/// Decides, at span creation time, whether a call is recorded.
///
/// The decision happens before the span is named or tagged (naming and
/// tagging only run for sampled spans), so implementations see the
/// parent context and the trace id, nothing else.
pub trait ShouldSample: CloneShouldSample + Send + Sync + fmt::Debug {
    /// Returns the sampling decision for a span about to be created.
    fn should_sample(&self, parent: Option<&TraceContext>, trace_id: TraceId) -> SamplingDecision;
}

/// This trait should not be used directly; implement [`ShouldSample`]
/// with a `Clone` type instead.
pub trait CloneShouldSample {
    fn box_clone(&self) -> Box<dyn ShouldSample>;
}

impl<T> CloneShouldSample for T
where
    T: ShouldSample + Clone + 'static,
{
    fn box_clone(&self) -> Box<dyn ShouldSample> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ShouldSample> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Built-in samplers covering the common policies. For anything more
/// elaborate, implement [`ShouldSample`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Sampler {
    /// Record every call.
    AlwaysOn,
    /// Record no calls. Trace context still propagates downstream.
    AlwaysOff,
    /// Follow the parent span's sampling decision; delegate to the inner
    /// sampler for trace roots.
    ParentBased(Box<dyn ShouldSample>),
    /// Record a given fraction of traces, derived deterministically from
    /// the trace id so every span of a trace lands on the same side.
    /// Fractions >= 1 always record; fractions <= 0 never do.
    TraceIdRatioBased(f64),
}

impl ShouldSample for Sampler {
    fn should_sample(&self, parent: Option<&TraceContext>, trace_id: TraceId) -> SamplingDecision {
        match self {
            Sampler::AlwaysOn => SamplingDecision::RecordAndSample,
            Sampler::AlwaysOff => SamplingDecision::Drop,
            Sampler::ParentBased(delegate) => match parent {
                Some(parent) => {
                    if parent.is_sampled() {
                        SamplingDecision::RecordAndSample
                    } else {
                        SamplingDecision::Drop
                    }
                }
                None => delegate.should_sample(parent, trace_id),
            },
            Sampler::TraceIdRatioBased(fraction) => {
                sample_based_on_probability(fraction, trace_id)
            }
        }
    }
}

fn sample_based_on_probability(prob: &f64, trace_id: TraceId) -> SamplingDecision {
    if *prob >= 1.0 {
        SamplingDecision::RecordAndSample
    } else {
        let prob_upper_bound = (prob.max(0.0) * (1u64 << 63) as f64) as u64;
        let bytes = trace_id.to_bytes();
        let (_, low) = bytes.split_at(8);
        let trace_id_low = u64::from_be_bytes(low.try_into().unwrap());
        let rnd_from_trace_id = trace_id_low >> 1;

        if rnd_from_trace_id < prob_upper_bound {
            SamplingDecision::RecordAndSample
        } else {
            SamplingDecision::Drop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{RandomIdGenerator, SpanId, TraceFlags};
    use crate::IdGenerator;

    fn parent(sampled: bool) -> TraceContext {
        TraceContext::new(
            TraceId::from(1),
            SpanId::from(1),
            SpanId::INVALID,
            TraceFlags::default().with_sampled(sampled),
        )
    }

    #[rustfmt::skip]
    fn sampler_data() -> Vec<(&'static str, Sampler, Option<bool>, SamplingDecision)> {
        vec![
            ("always_on", Sampler::AlwaysOn, None, SamplingDecision::RecordAndSample),
            ("always_off", Sampler::AlwaysOff, None, SamplingDecision::Drop),
            ("always_off_ignores_parent", Sampler::AlwaysOff, Some(true), SamplingDecision::Drop),
            ("parent_sampled", Sampler::ParentBased(Box::new(Sampler::AlwaysOff)), Some(true), SamplingDecision::RecordAndSample),
            ("parent_not_sampled", Sampler::ParentBased(Box::new(Sampler::AlwaysOn)), Some(false), SamplingDecision::Drop),
            ("parent_based_root_delegates", Sampler::ParentBased(Box::new(Sampler::AlwaysOn)), None, SamplingDecision::RecordAndSample),
            ("ratio_one", Sampler::TraceIdRatioBased(1.0), None, SamplingDecision::RecordAndSample),
            ("ratio_zero", Sampler::TraceIdRatioBased(0.0), None, SamplingDecision::Drop),
            ("ratio_negative", Sampler::TraceIdRatioBased(-1.0), None, SamplingDecision::Drop),
        ]
    }

    #[test]
    fn built_in_samplers() {
        let generator = RandomIdGenerator::default();
        for (name, sampler, parent_sampled, expected) in sampler_data() {
            let parent_cx = parent_sampled.map(parent);
            let decision = sampler.should_sample(parent_cx.as_ref(), generator.new_trace_id());
            assert_eq!(decision, expected, "{}", name);
        }
    }

    #[test]
    fn ratio_is_deterministic_per_trace_id() {
        let sampler = Sampler::TraceIdRatioBased(0.5);
        let generator = RandomIdGenerator::default();
        for _ in 0..16 {
            let trace_id = generator.new_trace_id();
            let first = sampler.should_sample(None, trace_id);
            let second = sampler.should_sample(None, trace_id);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn ratio_roughly_matches_fraction() {
        let sampler = Sampler::TraceIdRatioBased(0.5);
        let generator = RandomIdGenerator::default();
        let sampled = (0..1000)
            .filter(|_| {
                sampler.should_sample(None, generator.new_trace_id())
                    == SamplingDecision::RecordAndSample
            })
            .count();
        // Loose bounds; the point is that the ratio is neither 0 nor 1.
        assert!((300..700).contains(&sampled), "sampled {} of 1000", sampled);
    }
}
