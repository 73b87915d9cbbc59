//! Correlation identifiers joined across cache, protocol, and broker diagnostics.

// self
use crate::_prelude::*;

/// Per-request diagnostic identifier sent as `client-request-id` and attached to every span
/// and error produced while acquiring a token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);
impl CorrelationId {
	/// Generates a random (v4) correlation id.
	pub fn new_v4() -> Self {
		Self(Uuid::new_v4())
	}

	/// Wraps an existing UUID.
	pub const fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	/// Returns the underlying UUID.
	pub const fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl From<Uuid> for CorrelationId {
	fn from(value: Uuid) -> Self {
		Self(value)
	}
}
impl Debug for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationId({})", self.0)
	}
}
impl Display for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}
impl FromStr for CorrelationId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}
