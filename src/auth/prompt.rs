//! Prompt behavior controlling when the sign-in surface is shown.

// self
use crate::_prelude::*;

/// How eagerly a request shows UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptBehavior {
	/// Use cached or refreshed tokens; prompt only when they are unusable.
	#[default]
	Auto,
	/// Skip the cache and refresh paths and always ask the user to sign in. A broker, when
	/// eligible, handles the prompt.
	Always,
	/// Like [`Auto`](Self::Auto), but an interactive sign-in asks the authority to refresh the
	/// session (`prompt=refresh_session`).
	RefreshSession,
	/// Like [`Always`](Self::Always), but never delegated to a broker.
	ForcePrompt,
}
impl PromptBehavior {
	/// Returns `true` when cached and refreshed tokens must be ignored.
	pub const fn skips_cache(self) -> bool {
		matches!(self, Self::Always | Self::ForcePrompt)
	}

	/// Returns `true` when broker delegation is suppressed.
	pub const fn bypasses_broker(self) -> bool {
		matches!(self, Self::ForcePrompt)
	}

	/// Value of the authorize URL `prompt` parameter, if any.
	pub const fn prompt_parameter(self) -> Option<&'static str> {
		match self {
			Self::Auto => None,
			Self::Always | Self::ForcePrompt => Some("login"),
			Self::RefreshSession => Some("refresh_session"),
		}
	}
}
