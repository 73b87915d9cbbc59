//! Thread-safe in-memory [`TokenStore`] for tests, demos, and process-lifetime caches.

// self
use crate::{
	_prelude::*,
	auth::CacheEntry,
	store::{CacheKey, StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<CacheKey, CacheEntry>>>;

/// Storage backend that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Clones the entry stored under `key` without going through the async contract.
	pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
		self.0.read().get(key).cloned()
	}

	fn save_now(map: StoreMap, key: CacheKey, entry: CacheEntry) -> Result<(), StoreError> {
		map.write().insert(key, entry);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>> {
		let entry = self.get(key);

		Box::pin(async move { Ok(entry) })
	}

	fn save(&self, key: CacheKey, entry: CacheEntry) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, key, entry) })
	}

	fn remove<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<CacheEntry>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key)) })
	}

	fn keys(&self) -> StoreFuture<'_, Vec<CacheKey>> {
		let keys = self.0.read().keys().cloned().collect();

		Box::pin(async move { Ok(keys) })
	}
}
