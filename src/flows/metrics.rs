// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing which acquisition paths ran.
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
	cache_hits: AtomicU64,
	refresh_attempts: AtomicU64,
	broker_invocations: AtomicU64,
	interactive_prompts: AtomicU64,
	assertion_exchanges: AtomicU64,
}
impl AcquisitionMetrics {
	/// Acquisitions served straight from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Refresh token redemptions sent to the token endpoint.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Invocations delegated to the broker process.
	pub fn broker_invocations(&self) -> u64 {
		self.broker_invocations.load(Ordering::Relaxed)
	}

	/// Times the login surface was shown.
	pub fn interactive_prompts(&self) -> u64 {
		self.interactive_prompts.load(Ordering::Relaxed)
	}

	/// Assertion redemptions sent to the token endpoint.
	pub fn assertion_exchanges(&self) -> u64 {
		self.assertion_exchanges.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_broker_invocation(&self) {
		self.broker_invocations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_interactive_prompt(&self) {
		self.interactive_prompts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_assertion_exchange(&self) {
		self.assertion_exchanges.fetch_add(1, Ordering::Relaxed);
	}
}
