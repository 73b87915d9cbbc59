//! Shared plumbing for acquisition paths: stage outcomes, observation, and cache commits.

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, CorrelationId, UserIdentifierKind},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{RequestVariant, SealedRequest},
	result::{AuthenticationResult, AuthenticationToken, TokenSource},
	store::CacheKey,
};

/// Terminal outcome of one acquisition path before it is wrapped into a result.
#[derive(Debug)]
pub(crate) enum Outcome {
	Token(AuthenticationToken),
	Cancelled,
}

/// Runs an entry point under its flow span and converts the outcome into a result.
pub(crate) async fn finish<F>(
	kind: FlowKind,
	stage: &'static str,
	correlation_id: CorrelationId,
	fut: F,
) -> AuthenticationResult
where
	F: Future<Output = Result<Outcome>>,
{
	let span = FlowSpan::new(kind, stage, correlation_id);

	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	let outcome = span.instrument(fut).await;

	record(kind, &outcome);

	match outcome {
		Ok(Outcome::Token(token)) => AuthenticationResult::Succeeded(token),
		Ok(Outcome::Cancelled) => AuthenticationResult::Cancelled { correlation_id },
		Err(e) => AuthenticationResult::failed(correlation_id, e),
	}
}

/// Records the outcome of one path.
pub(crate) fn record<T>(kind: FlowKind, outcome: &Result<T>)
where
	T: StageOutcome,
{
	let label = match outcome {
		Ok(value) if value.is_cancelled() => FlowOutcome::Cancelled,
		Ok(_) => FlowOutcome::Success,
		Err(_) => FlowOutcome::Failure,
	};

	obs::record_flow_outcome(kind, label);
}

pub(crate) trait StageOutcome {
	fn is_cancelled(&self) -> bool {
		false
	}
}
impl StageOutcome for Outcome {
	fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}
impl StageOutcome for Option<AuthenticationToken> {}

impl<C, M, V> SealedRequest<C, M, V>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	V: RequestVariant,
{
	/// Verifies the issued identity, writes the entry, and builds the caller-facing token.
	///
	/// Fresh tokens land under the user the authority reported; refreshed tokens stay under
	/// the slot they were read from.
	pub(crate) async fn commit(
		&self,
		entry: CacheEntry,
		source: TokenSource,
		key: Option<CacheKey>,
	) -> Result<AuthenticationToken> {
		self.verify_user(&entry)?;

		let key = key.unwrap_or_else(|| self.key_for_entry(&entry));

		self.context.cache().store(key, entry.clone()).await?;

		AuthenticationToken::from_entry(entry, source, self.correlation_id)
	}

	fn verify_user(&self, entry: &CacheEntry) -> Result<()> {
		let (Some(user), Some(info)) = (&self.params.user, &entry.user_info) else {
			return Ok(());
		};

		if matches!(user.kind, UserIdentifierKind::OptionalDisplayableId) || user.matches(info) {
			return Ok(());
		}

		let actual = match user.kind {
			UserIdentifierKind::UniqueId => info.unique_id.clone(),
			_ => info.user_id.clone(),
		};

		Err(Error::UserMismatch {
			expected: user.id.to_string(),
			actual: actual.unwrap_or_default(),
		})
	}

	fn key_for_entry(&self, entry: &CacheEntry) -> CacheKey {
		let reported = entry.user_info.as_ref().and_then(|info| info.user_id.as_deref());
		let requested = self.params.user.as_ref().and_then(|user| user.login_hint());

		self.cache_query().key_for(reported.or(requested))
	}
}
