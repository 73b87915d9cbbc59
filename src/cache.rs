//! Token cache façade: expiry-aware lookups, user resolution, and per-key serialized writes.
//!
//! The engine never touches a [`TokenStore`] directly. Every read and write goes through
//! [`TokenCache`], which serializes operations on the same [`CacheKey`] so concurrent
//! acquisitions cannot interleave partial updates (the last completed write wins).

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, ClientId, EntryStatus, UserIdentifier, UserIdentifierKind},
	store::{CacheKey, TokenStore},
};

type GuardMap = Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>;

/// Default window before expiry in which access tokens are treated as expired.
pub const DEFAULT_EXPIRATION_BUFFER: Duration = Duration::seconds(300);
/// Largest accepted expiration buffer.
pub const MAX_EXPIRATION_BUFFER: Duration = Duration::days(1);

/// Inputs identifying the cache slot(s) a request may be served from.
#[derive(Clone, Copy, Debug)]
pub struct CacheQuery<'a> {
	/// Authority URL.
	pub authority: &'a Url,
	/// Target resource.
	pub resource: &'a str,
	/// Requesting client.
	pub client_id: &'a ClientId,
	/// Requested user; `None` accepts any single cached user.
	pub user: Option<&'a UserIdentifier>,
}
impl CacheQuery<'_> {
	/// Key for the exact slot addressed by a displayable identifier.
	pub fn key_for(&self, user_id: Option<&str>) -> CacheKey {
		CacheKey::new(self.authority, self.resource, self.client_id, user_id)
	}
}

/// Entry found by a lookup together with the key it is stored under.
#[derive(Clone, Debug)]
pub struct CacheHit {
	/// Slot the entry was read from.
	pub key: CacheKey,
	/// Snapshot of the stored entry.
	pub entry: CacheEntry,
}

/// Outcome of [`TokenCache::lookup`].
#[derive(Clone, Debug)]
pub enum CacheLookup {
	/// The access token is usable as-is.
	Valid(CacheHit),
	/// Only the refresh token is usable.
	RefreshOnly(CacheHit),
	/// Nothing usable is cached.
	Miss,
}

/// Façade over a [`TokenStore`].
pub struct TokenCache {
	store: Arc<dyn TokenStore>,
	expiration_buffer: Duration,
	write_guards: GuardMap,
	refresh_guards: GuardMap,
}
impl TokenCache {
	/// Wraps a storage backend with the default expiration buffer.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self {
			store,
			expiration_buffer: DEFAULT_EXPIRATION_BUFFER,
			write_guards: Default::default(),
			refresh_guards: Default::default(),
		}
	}

	/// Overrides the expiration buffer, clamped to `0..=MAX_EXPIRATION_BUFFER`.
	pub fn with_expiration_buffer(mut self, buffer: Duration) -> Self {
		self.expiration_buffer = buffer.clamp(Duration::ZERO, MAX_EXPIRATION_BUFFER);

		self
	}

	/// Window before expiry in which access tokens count as expired.
	pub fn expiration_buffer(&self) -> Duration {
		self.expiration_buffer
	}

	/// Underlying storage backend.
	pub fn backend(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Finds the entry serving `query` and classifies it at `now`.
	///
	/// A displayable user identifier addresses its slot directly. A unique id, or no
	/// identifier at all, scans the slots for the (authority, resource, client) triple; with no
	/// identifier, more than one cached user yields [`Error::MultipleUsers`].
	pub async fn lookup(&self, query: &CacheQuery<'_>, now: OffsetDateTime) -> Result<CacheLookup> {
		let hit = match query.user {
			Some(user) if user.is_displayable() => {
				let key = query.key_for(Some(user.id.as_ref()));

				self.load(&key).await?.map(|entry| CacheHit { key, entry })
			},
			user => self.resolve_any(query, user).await?,
		};
		let Some(hit) = hit else {
			return Ok(CacheLookup::Miss);
		};

		Ok(match hit.entry.status_at(now, self.expiration_buffer) {
			EntryStatus::Valid => CacheLookup::Valid(hit),
			EntryStatus::RefreshOnly => CacheLookup::RefreshOnly(hit),
			EntryStatus::Unusable => CacheLookup::Miss,
		})
	}

	/// Reads a single slot under its key guard.
	pub async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
		let _serialized = KeyLease::acquire(&self.write_guards, key).await;

		Ok(self.store.load(key).await?)
	}

	/// Writes `entry` under `key`, serialized with every other operation on that key.
	pub async fn store(&self, key: CacheKey, entry: CacheEntry) -> Result<()> {
		let _serialized = KeyLease::acquire(&self.write_guards, &key).await;

		Ok(self.store.save(key, entry).await?)
	}

	/// Removes the entry under `key`.
	pub async fn remove(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
		let _serialized = KeyLease::acquire(&self.write_guards, key).await;

		Ok(self.store.remove(key).await?)
	}

	/// Singleflight lease held while a refresh token for `key` is redeemed.
	pub(crate) async fn refresh_lease(&self, key: &CacheKey) -> KeyLease<'_> {
		KeyLease::acquire(&self.refresh_guards, key).await
	}

	async fn resolve_any(
		&self,
		query: &CacheQuery<'_>,
		user: Option<&UserIdentifier>,
	) -> Result<Option<CacheHit>> {
		let target = query.key_for(None);
		let mut hits = Vec::new();

		for key in self.store.keys().await? {
			if !key.same_target(&target) {
				continue;
			}
			let Some(entry) = self.load(&key).await? else {
				continue;
			};

			match user {
				Some(user) if matches!(user.kind, UserIdentifierKind::UniqueId) => {
					if entry.user_info.as_ref().is_some_and(|info| user.matches(info)) {
						return Ok(Some(CacheHit { key, entry }));
					}
				},
				_ => hits.push(CacheHit { key, entry }),
			}
		}

		match hits.len() {
			0 | 1 => Ok(hits.pop()),
			_ => Err(Error::MultipleUsers),
		}
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache").field("expiration_buffer", &self.expiration_buffer).finish()
	}
}

/// Exclusive hold on one key of a guard map.
///
/// Dropping the lease unlocks the key and removes its mutex from the map once no other task
/// holds or waits on it, so the maps only track keys in use.
pub(crate) struct KeyLease<'a> {
	guards: &'a GuardMap,
	key: CacheKey,
	held: Option<MutexGuardArc<()>>,
}
impl<'a> KeyLease<'a> {
	async fn acquire(guards: &'a GuardMap, key: &CacheKey) -> KeyLease<'a> {
		let mutex = guards.lock().entry(key.clone()).or_default().clone();
		let held = mutex.lock_arc().await;

		KeyLease { guards, key: key.clone(), held: Some(held) }
	}
}
impl Drop for KeyLease<'_> {
	fn drop(&mut self) {
		drop(self.held.take());

		let mut guards = self.guards.lock();

		if guards.get(&self.key).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
			guards.remove(&self.key);
		}
	}
}
