//! Token acquisition engine for native OAuth 2.0 / OpenID Connect clients.
//!
//! Configure an [`AuthenticationRequest`](request::AuthenticationRequest) against a shared
//! [`AuthenticationContext`](context::AuthenticationContext), seal it, and run one of its
//! entry points. The engine walks the cache, refresh, broker, and interactive paths in order
//! and resolves to exactly one [`AuthenticationResult`](result::AuthenticationResult).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod broker;
pub mod cache;
pub mod context;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod presenter;
pub mod request;
pub mod result;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		authority::{AuthorityDescriptor, DefaultAuthorityStrategy},
		context::AuthenticationContext,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		store::{MemoryStore, TokenStore},
	};

	/// Context type alias used by reqwest-backed integration tests.
	pub type ReqwestTestContext = AuthenticationContext<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`AuthenticationContext`] backed by an in-memory store, the default
	/// authority strategy, and the reqwest transport used across integration tests.
	///
	/// The context is returned unwrapped so tests can attach presenters and brokers before
	/// sharing it behind an [`Arc`].
	pub fn build_reqwest_test_context(
		descriptor: AuthorityDescriptor,
	) -> (ReqwestTestContext, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let context = AuthenticationContext::with_http_client(
			descriptor,
			store,
			Arc::new(DefaultAuthorityStrategy),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(context, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		marker::PhantomData,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;
	pub use uuid::Uuid;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
