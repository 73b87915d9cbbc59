//! Authority descriptor data structures shared by every acquisition path.

/// Builder API for assembling authority descriptors.
pub mod builder;
/// Grant identifiers and the descriptor's grant flags.
pub mod grant;
/// Authority-specific protocol toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::_prelude::*;

/// Endpoint set declared by an authority descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityEndpoints {
	/// Authorization endpoint shown to the user on the interactive path.
	pub authorization: Url,
	/// Token endpoint used for code, refresh-token, and assertion exchanges.
	pub token: Url,
}

/// Immutable authority descriptor consumed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityDescriptor {
	/// Authority base URL; the first component of every cache key.
	pub authority: Url,
	/// Endpoint definitions exposed by the authority.
	pub endpoints: AuthorityEndpoints,
	/// Enabled grant flags.
	pub supported_grants: SupportedGrants,
	/// Authority-specific quirks.
	#[serde(default)]
	pub quirks: AuthorityQuirks,
}
impl AuthorityDescriptor {
	/// Creates a new builder for the provided authority URL.
	pub fn builder(authority: Url) -> AuthorityDescriptorBuilder {
		AuthorityDescriptorBuilder::new(authority)
	}

	/// Checks whether the descriptor enables a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}

	/// Parses and validates a descriptor from JSON configuration.
	pub fn from_json(json: &str) -> Result<Self, AuthorityDescriptorError> {
		let descriptor: Self = serde_json::from_str(json)
			.map_err(|e| AuthorityDescriptorError::Malformed { reason: e.to_string() })?;

		descriptor.validate()?;

		Ok(descriptor)
	}
}
