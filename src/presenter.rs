//! Presentation collaborator for the interactive path.
//!
//! The engine only needs two operations from a login surface: show the authorize URL until
//! the browser reaches the redirect URI, and dismiss the surface. [`PresentationGuard`]
//! scopes the surface so `dismiss` runs exactly once on every exit path, including errors,
//! cancellation, and the acquisition future being dropped mid-flight.

// self
use crate::_prelude::*;

/// Boxed future returned by [`AuthorizationPresenter::show`].
pub type PresenterFuture<'a> = Pin<Box<dyn Future<Output = Result<Url, PresentationError>> + 'a + Send>>;

/// Login surface (embedded web view, system browser session, ...).
pub trait AuthorizationPresenter
where
	Self: Send + Sync,
{
	/// Navigates to `start` and resolves with the first URL that begins with `end`.
	fn show(&self, start: Url, end: Url) -> PresenterFuture<'_>;

	/// Tears the surface down; `animated` is `false` when `show` failed.
	fn dismiss(&self, animated: bool);
}

/// Failures reported by a presenter.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PresentationError {
	/// The user closed the surface.
	#[error("The user cancelled the sign-in.")]
	Cancelled,
	/// The surface cannot be shown (headless session, no window).
	#[error("The login surface is unavailable: {message}.")]
	Unavailable {
		/// Presenter-supplied description.
		message: String,
	},
	/// Navigation failed.
	#[error("The login surface failed: {message}.")]
	Failed {
		/// Presenter-supplied description.
		message: String,
	},
}

/// Scoped ownership of a shown login surface.
pub struct PresentationGuard<'a> {
	presenter: &'a dyn AuthorizationPresenter,
	shown: bool,
}
impl<'a> PresentationGuard<'a> {
	/// Acquires the surface; it is dismissed when the guard drops.
	pub fn new(presenter: &'a dyn AuthorizationPresenter) -> Self {
		Self { presenter, shown: false }
	}

	/// Shows the surface and waits for the redirect.
	pub async fn show(&mut self, start: Url, end: Url) -> Result<Url, PresentationError> {
		let outcome = self.presenter.show(start, end).await;

		self.shown = outcome.is_ok();

		outcome
	}
}
impl Drop for PresentationGuard<'_> {
	fn drop(&mut self) {
		self.presenter.dismiss(self.shown);
	}
}
impl Debug for PresentationGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PresentationGuard").field("shown", &self.shown).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[derive(Default)]
	struct Counting {
		dismissals: AtomicUsize,
		animated: Mutex<Vec<bool>>,
		outcome: Option<Result<Url, PresentationError>>,
	}
	impl AuthorizationPresenter for Counting {
		fn show(&self, _start: Url, _end: Url) -> PresenterFuture<'_> {
			let outcome = self.outcome.clone().unwrap_or(Err(PresentationError::Cancelled));

			Box::pin(async move { outcome })
		}

		fn dismiss(&self, animated: bool) {
			self.dismissals.fetch_add(1, Ordering::SeqCst);
			self.animated.lock().push(animated);
		}
	}

	fn urls() -> (Url, Url) {
		(
			Url::parse("https://login.example.com/authorize").expect("Start URL should parse."),
			Url::parse("https://app/redirect").expect("End URL should parse."),
		)
	}

	#[tokio::test]
	async fn guard_dismisses_once_after_cancellation() {
		let presenter = Counting::default();
		let (start, end) = urls();

		{
			let mut guard = PresentationGuard::new(&presenter);

			assert_eq!(guard.show(start, end).await, Err(PresentationError::Cancelled));
		}

		assert_eq!(presenter.dismissals.load(Ordering::SeqCst), 1);
		assert_eq!(*presenter.animated.lock(), vec![false]);
	}

	#[tokio::test]
	async fn guard_dismisses_animated_after_success() {
		let (start, end) = urls();
		let presenter = Counting {
			outcome: Some(Ok(Url::parse("https://app/redirect?code=XYZ").expect("URL should parse."))),
			..Counting::default()
		};

		{
			let mut guard = PresentationGuard::new(&presenter);

			guard.show(start, end).await.expect("Show should succeed.");
		}

		assert_eq!(*presenter.animated.lock(), vec![true]);
	}

	#[test]
	fn dropping_an_unshown_guard_still_dismisses() {
		let presenter = Counting::default();

		drop(PresentationGuard::new(&presenter));

		assert_eq!(presenter.dismissals.load(Ordering::SeqCst), 1);
	}
}
