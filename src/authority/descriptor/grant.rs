// self
use crate::_prelude::*;

/// OAuth 2.0 grant types the engine exchanges at the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant, redeemed after the interactive path.
	AuthorizationCode,
	/// Refresh Token grant used by silent acquisition.
	RefreshToken,
	/// SAML 1.1 bearer assertion grant.
	Saml11Bearer,
	/// SAML 2.0 bearer assertion grant.
	Saml2Bearer,
}
impl GrantType {
	/// Returns the `grant_type` form value.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::Saml11Bearer => "urn:ietf:params:oauth:grant-type:saml1_1-bearer",
			GrantType::Saml2Bearer => "urn:ietf:params:oauth:grant-type:saml2-bearer",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Grant flags wired into the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedGrants {
	/// Authorization Code grant enabled.
	pub authorization_code: bool,
	/// Refresh Token grant enabled.
	pub refresh_token: bool,
	/// SAML bearer assertion grants enabled.
	pub assertion: bool,
}
impl SupportedGrants {
	/// Flags for a typical public native client: code, refresh, and assertion grants.
	pub const fn all() -> Self {
		Self { authorization_code: true, refresh_token: true, assertion: true }
	}

	/// Returns true if the provided grant is enabled.
	pub fn supports(self, grant: GrantType) -> bool {
		match grant {
			GrantType::AuthorizationCode => self.authorization_code,
			GrantType::RefreshToken => self.refresh_token,
			GrantType::Saml11Bearer | GrantType::Saml2Bearer => self.assertion,
		}
	}

	/// Enables a grant.
	pub fn enable(mut self, grant: GrantType) -> Self {
		match grant {
			GrantType::AuthorizationCode => self.authorization_code = true,
			GrantType::RefreshToken => self.refresh_token = true,
			GrantType::Saml11Bearer | GrantType::Saml2Bearer => self.assertion = true,
		}

		self
	}

	/// Returns true when no grants are enabled.
	pub fn is_empty(self) -> bool {
		!self.authorization_code && !self.refresh_token && !self.assertion
	}
}
