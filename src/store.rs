//! Cache storage collaborator contracts and built-in backends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, ClientId},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable key-value storage for cache entries.
///
/// Backends own persistence and encryption; the [`TokenCache`](crate::cache::TokenCache)
/// façade layers expiry awareness and per-key write serialization on top.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the entry stored under `key`, if present.
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>>;

	/// Persists or replaces the entry stored under `key`.
	fn save(&self, key: CacheKey, entry: CacheEntry) -> StoreFuture<'_, ()>;

	/// Removes and returns the entry stored under `key`.
	fn remove<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>>;

	/// Lists every stored key.
	fn keys(&self) -> StoreFuture<'_, Vec<CacheKey>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Cache key: (authority, resource, client id, user id).
///
/// The authority is lower-cased without a trailing slash and the user id is lower-cased, so
/// lookups are insensitive to the casing authorities apply to sign-in names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Normalized authority URL.
	pub authority: String,
	/// Resource the tokens were issued for.
	pub resource: String,
	/// Client the tokens were issued to.
	pub client_id: ClientId,
	/// Normalized displayable user id; `None` when the authority reported no user.
	pub user_id: Option<String>,
}
impl CacheKey {
	/// Builds a normalized key.
	pub fn new(authority: &Url, resource: &str, client_id: &ClientId, user_id: Option<&str>) -> Self {
		Self {
			authority: normalize_authority(authority),
			resource: resource.to_owned(),
			client_id: client_id.clone(),
			user_id: user_id.map(str::to_ascii_lowercase),
		}
	}

	/// Returns a copy of this key bound to another user.
	pub fn with_user(&self, user_id: Option<&str>) -> Self {
		Self { user_id: user_id.map(str::to_ascii_lowercase), ..self.clone() }
	}

	/// Returns `true` when both keys address the same authority, resource, and client.
	pub fn same_target(&self, other: &Self) -> bool {
		self.authority == other.authority
			&& self.resource == other.resource
			&& self.client_id == other.client_id
	}
}

fn normalize_authority(authority: &Url) -> String {
	authority.as_str().trim_end_matches('/').to_ascii_lowercase()
}
