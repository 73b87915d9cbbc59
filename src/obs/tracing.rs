// self
use crate::{_prelude::*, auth::CorrelationId, obs::FlowKind};

/// Resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span shared by every event emitted while one acquisition runs.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a span tagged with the stage and the acquisition's correlation id.
	pub fn new(kind: FlowKind, stage: &'static str, correlation_id: CorrelationId) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_native.flow",
				flow = kind.as_str(),
				stage,
				correlation_id = %correlation_id
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, correlation_id);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when the engine moves from one strategy to the next and counts the
/// hand-off.
pub fn trace_escalation(from: FlowKind, to: FlowKind, reason: &str) {
	super::record_escalation(from, to);

	#[cfg(feature = "tracing")]
	{
		tracing::debug!(from = from.as_str(), to = to.as_str(), reason, "escalating acquisition");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (from, to, reason);
	}
}

/// Emits a warning when a rejected entry could not be evicted and stays in the cache.
pub fn trace_stale_entry_retained(kind: FlowKind, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(flow = kind.as_str(), error = %error, "failed to evict rejected cache entry");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, error);
	}
}
