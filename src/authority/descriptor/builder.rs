// self
use crate::{
	_prelude::*,
	authority::{AuthorityDescriptor, AuthorityEndpoints, AuthorityQuirks, GrantType, SupportedGrants},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthorityDescriptorError {
	/// Authority URL cannot carry path segments (e.g. `mailto:`).
	#[error("Authority URL cannot be used as a base: {url}.")]
	InvalidAuthority {
		/// Authority URL that failed validation.
		url: String,
	},
	/// At least one grant must be enabled.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// Authority and endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// JSON configuration could not be parsed.
	#[error("Authority descriptor JSON is malformed: {reason}.")]
	Malformed {
		/// Parser failure description.
		reason: String,
	},
}

/// Builder for [`AuthorityDescriptor`] values.
#[derive(Debug)]
pub struct AuthorityDescriptorBuilder {
	/// Authority base URL.
	pub authority: Url,
	/// Explicit authorization endpoint; defaults to `<authority>/oauth2/authorize`.
	pub authorization_endpoint: Option<Url>,
	/// Explicit token endpoint; defaults to `<authority>/oauth2/token`.
	pub token_endpoint: Option<Url>,
	/// Grants enabled for the authority.
	pub supported_grants: SupportedGrants,
	/// Authority-specific quirks.
	pub quirks: AuthorityQuirks,
}
impl AuthorityDescriptorBuilder {
	/// Creates a new builder seeded with the authority URL.
	pub fn new(authority: Url) -> Self {
		Self {
			authority,
			authorization_endpoint: None,
			token_endpoint: None,
			supported_grants: SupportedGrants::default(),
			quirks: AuthorityQuirks::default(),
		}
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Enables a single grant type.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Enables multiple grants.
	pub fn support_grants<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		for grant in grants {
			self.supported_grants = self.supported_grants.enable(grant);
		}

		self
	}

	/// Overrides the quirks.
	pub fn quirks(mut self, quirks: AuthorityQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<AuthorityDescriptor, AuthorityDescriptorError> {
		let authorization = match self.authorization_endpoint {
			Some(url) => url,
			None => default_endpoint(&self.authority, "authorize")?,
		};
		let token = match self.token_endpoint {
			Some(url) => url,
			None => default_endpoint(&self.authority, "token")?,
		};
		let descriptor = AuthorityDescriptor {
			authority: self.authority,
			endpoints: AuthorityEndpoints { authorization, token },
			supported_grants: self.supported_grants,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl AuthorityDescriptor {
	pub(crate) fn validate(&self) -> Result<(), AuthorityDescriptorError> {
		if self.supported_grants.is_empty() {
			return Err(AuthorityDescriptorError::NoSupportedGrants);
		}

		validate_endpoint("authority", &self.authority)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn default_endpoint(authority: &Url, leaf: &str) -> Result<Url, AuthorityDescriptorError> {
	let mut url = authority.clone();

	url.set_query(None);
	url.set_fragment(None);
	url.path_segments_mut()
		.map_err(|_| AuthorityDescriptorError::InvalidAuthority { url: authority.to_string() })?
		.pop_if_empty()
		.extend(["oauth2", leaf]);

	Ok(url)
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), AuthorityDescriptorError> {
	if url.scheme() != "https" {
		Err(AuthorityDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), AuthorityDescriptorError> {
	if delimiter.is_control() {
		Err(AuthorityDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
