// self
use crate::_prelude::*;

/// Authority-specific toggles that influence request construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityQuirks {
	/// Send a PKCE S256 challenge on the authorize URL and the verifier on redemption.
	pub pkce_required: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Send the correlation id as `client-request-id` on token and authorize requests.
	pub send_client_request_id: bool,
}
impl Default for AuthorityQuirks {
	fn default() -> Self {
		Self { pkce_required: true, scope_delimiter: ' ', send_client_request_id: true }
	}
}
