//! The acquisition state machine behind every request entry point.
//!
//! Entry points on [`SealedRequest`](crate::request::SealedRequest) resolve an
//! [`AcquisitionPlan`] from the prompt behavior, the silent flag, and broker eligibility, then
//! walk the cache, refresh, broker, and interactive paths in that order. Every path writes
//! new tokens through the [`TokenCache`](crate::cache::TokenCache) façade before the single
//! [`AuthenticationResult`] is returned.

pub mod plan;

mod acquire;
mod assertion;
mod brokered;
mod common;
mod interactive;
mod metrics;
mod session;
mod silent;

pub use metrics::AcquisitionMetrics;
pub use plan::{AcquisitionPlan, Escalation};

// self
use crate::{_prelude::*, result::AuthenticationResult};

/// Awaits an acquisition and delivers its result to a completion callback.
pub async fn with_completion<F, Done>(acquisition: F, completion: Done)
where
	F: Future<Output = AuthenticationResult>,
	Done: FnOnce(AuthenticationResult),
{
	completion(acquisition.await);
}
