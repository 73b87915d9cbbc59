//! Input validation shared by request construction, setters, and entry points.
//!
//! Every check returns a typed [`ParameterError`]; nothing here touches the cache, the
//! network, or a login surface.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, UserId},
	error::ParameterError,
};

/// Mandatory request fields after validation.
#[derive(Clone, Debug)]
pub(crate) struct MandatoryFields {
	pub(crate) redirect_uri: Url,
	pub(crate) client_id: ClientId,
	pub(crate) resource: String,
}

/// Validates the mandatory fields: presence first (left to right), then well-formedness.
pub(crate) fn mandatory_fields(
	redirect_uri: &str,
	client_id: &str,
	resource: &str,
) -> Result<MandatoryFields, ParameterError> {
	let redirect_uri = require("redirect_uri", redirect_uri)?;
	let client_id = require("client_id", client_id)?;
	let resource = require("resource", resource)?;

	Ok(MandatoryFields {
		redirect_uri: redirect_uri_from(redirect_uri)?,
		client_id: ClientId::new(client_id).map_err(|e| invalid("client_id", e))?,
		resource: resource.to_owned(),
	})
}

/// Rejects absent or whitespace-only values and returns the trimmed view.
pub(crate) fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ParameterError> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(ParameterError::Missing { field });
	}

	Ok(trimmed)
}

/// Parses a redirect URI; it must be absolute (custom schemes are allowed).
pub(crate) fn redirect_uri_from(raw: &str) -> Result<Url, ParameterError> {
	let url = Url::parse(raw).map_err(|e| invalid("redirect_uri", e))?;

	if url.cannot_be_a_base() && url.scheme() != "urn" {
		return Err(ParameterError::Invalid {
			field: "redirect_uri",
			reason: "the URI has no authority or path".into(),
		});
	}

	Ok(url)
}

pub(crate) fn scope_from(raw: &str) -> Result<ScopeSet, ParameterError> {
	ScopeSet::from_str(raw.trim()).map_err(|e| invalid("scope", e))
}

pub(crate) fn user_id_from(raw: &str) -> Result<UserId, ParameterError> {
	UserId::new(require("user_id", raw)?).map_err(|e| invalid("user_id", e))
}

/// Normalizes raw extra query parameters: a leading `&` is dropped and blank input clears them.
pub(crate) fn extra_query_parameters_from(raw: &str) -> Option<String> {
	let trimmed = raw.trim().trim_start_matches('&');

	(!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn invalid(field: &'static str, reason: impl Display) -> ParameterError {
	ParameterError::Invalid { field, reason: reason.to_string() }
}
