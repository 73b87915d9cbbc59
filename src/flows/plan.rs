//! Acquisition policy table.

// self
use crate::auth::PromptBehavior;

/// What happens after the cache and refresh paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
	/// Nothing; silent requests stop here.
	None,
	/// Show the login surface.
	Interactive,
	/// Delegate to the broker and fall back to the login surface when it is unavailable or
	/// declines.
	BrokerThenInteractive,
}

/// Strategy order resolved for one acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionPlan {
	/// Serve a still-valid cached access token.
	pub use_cache: bool,
	/// Redeem a cached refresh token when the access token is unusable.
	pub use_refresh: bool,
	/// Path taken when the silent paths produce nothing.
	pub escalation: Escalation,
}
impl AcquisitionPlan {
	/// Resolves the plan.
	///
	/// | prompt | silent | broker eligible | cache + refresh | escalation |
	/// |---|---|---|---|---|
	/// | `Auto`, `RefreshSession` | no | no | yes | interactive |
	/// | `Auto`, `RefreshSession` | no | yes | yes | broker, then interactive |
	/// | `Always` | no | no | no | interactive |
	/// | `Always` | no | yes | no | broker, then interactive |
	/// | `ForcePrompt` | no | any | no | interactive |
	/// | any | yes | any | yes | none |
	pub const fn resolve(prompt: PromptBehavior, silent: bool, broker_eligible: bool) -> Self {
		if silent {
			return Self { use_cache: true, use_refresh: true, escalation: Escalation::None };
		}

		let silent_paths = !prompt.skips_cache();
		let escalation = if broker_eligible && !prompt.bypasses_broker() {
			Escalation::BrokerThenInteractive
		} else {
			Escalation::Interactive
		};

		Self { use_cache: silent_paths, use_refresh: silent_paths, escalation }
	}

	/// Returns `true` when the plan may show UI or invoke the broker.
	pub const fn may_interact(&self) -> bool {
		!matches!(self.escalation, Escalation::None)
	}
}
