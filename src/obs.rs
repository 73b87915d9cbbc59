//! Optional observability helpers for acquisition flows.
//!
//! # Feature Flags
//!
//! - `tracing` emits spans named `oauth2_native.flow` with `flow`, `stage`, and
//!   `correlation_id` fields, plus debug events whenever the engine escalates.
//! - `metrics` increments `oauth2_native_flow_total` (labels `flow`, `outcome`) and
//!   `oauth2_native_escalation_total` (labels `from`, `to`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Acquisition stages observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Whole acquisition driven by an entry point.
	Acquire,
	/// Silent-only acquisition (cache and refresh token).
	Silent,
	/// Refresh token redemption.
	Refresh,
	/// Broker delegation.
	Broker,
	/// Interactive sign-in and code redemption.
	Interactive,
	/// Assertion redemption.
	Assertion,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Acquire => "acquire",
			FlowKind::Silent => "silent",
			FlowKind::Refresh => "refresh",
			FlowKind::Broker => "broker",
			FlowKind::Interactive => "interactive",
			FlowKind::Assertion => "assertion",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Stage entered.
	Attempt,
	/// Stage produced tokens.
	Success,
	/// Stage failed.
	Failure,
	/// The user cancelled.
	Cancelled,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
