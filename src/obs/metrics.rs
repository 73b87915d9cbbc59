// self
use crate::obs::{FlowKind, FlowOutcome};

const FLOW_TOTAL: &str = "oauth2_native_flow_total";
const ESCALATION_TOTAL: &str = "oauth2_native_escalation_total";

/// Counts one stage outcome on `oauth2_native_flow_total` (no-op without `metrics`).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (FLOW_TOTAL, kind, outcome);
}

/// Counts a hand-off between strategies on `oauth2_native_escalation_total`.
pub fn record_escalation(from: FlowKind, to: FlowKind) {
	#[cfg(feature = "metrics")]
	metrics::counter!(ESCALATION_TOTAL, "from" => from.as_str(), "to" => to.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (ESCALATION_TOTAL, from, to);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_accept_every_label() {
		for kind in [FlowKind::Acquire, FlowKind::Broker, FlowKind::Assertion] {
			record_flow_outcome(kind, FlowOutcome::Cancelled);
		}

		record_escalation(FlowKind::Broker, FlowKind::Interactive);
	}
}
