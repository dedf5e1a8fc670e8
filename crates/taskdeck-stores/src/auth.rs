//! Authentication store
//!
//! Tracks the signed-in user and keeps the session credential in step with it.
//! Every outcome of a call is visible through the `user`, `loading` and `error`
//! signals; the methods only report success as a `bool`.

use futures_signals::signal::{Mutable, MutableSignal, MutableSignalCloned};
use serde_json::Value;
use std::fmt;
use taskdeck_client::models::{AuthResponse, Credentials, TokenRefreshResponse, User};
use taskdeck_client::{ApiClient, NO_BODY};
use tracing::{debug, info, warn};

/// Shared authentication state
///
/// Clones share the same signals, so a handle can be given to every consumer.
///
/// # Example
///
/// ```rust,no_run
/// use taskdeck_client::{ApiClient, Session};
/// use taskdeck_stores::AuthStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder().session(Session::in_memory()).build()?;
/// let auth = AuthStore::new(client);
///
/// auth.init().await;
/// if !auth.is_authenticated() && !auth.login("alice@example.com", "secret").await {
///     eprintln!("login failed: {:?}", auth.error());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthStore {
	client: ApiClient,
	user: Mutable<Option<User>>,
	loading: Mutable<bool>,
	error: Mutable<Option<String>>,
}

impl AuthStore {
	/// Creates a store in the loading state; call [`init`](Self::init) to settle it.
	pub fn new(client: ApiClient) -> Self {
		Self {
			client,
			user: Mutable::new(None),
			loading: Mutable::new(true),
			error: Mutable::new(None),
		}
	}

	pub fn client(&self) -> &ApiClient {
		&self.client
	}

	pub fn user(&self) -> Option<User> {
		self.user.get_cloned()
	}

	pub fn is_loading(&self) -> bool {
		self.loading.get()
	}

	pub fn error(&self) -> Option<String> {
		self.error.get_cloned()
	}

	pub fn user_signal(&self) -> MutableSignalCloned<Option<User>> {
		self.user.signal_cloned()
	}

	pub fn loading_signal(&self) -> MutableSignal<bool> {
		self.loading.signal()
	}

	pub fn error_signal(&self) -> MutableSignalCloned<Option<String>> {
		self.error.signal_cloned()
	}

	/// Returns true while a user is known.
	pub fn is_authenticated(&self) -> bool {
		self.user.lock_ref().is_some()
	}

	/// Returns true if the known user has the admin role.
	pub fn is_admin(&self) -> bool {
		self.user.lock_ref().as_ref().is_some_and(User::is_admin)
	}

	/// Restores the session from the stored credential, if any.
	///
	/// This is the only path that turns a persisted token back into a user.
	/// `loading` is cleared whatever the outcome.
	pub async fn init(&self) {
		if self.client.session().has_token().await {
			debug!("restoring session from stored credential");
			self.fetch_current_user().await;
		}
		self.loading.set_neq(false);
	}

	pub async fn register(&self, email: &str, password: &str) -> bool {
		self.authenticate("/auth/register", email, password).await
	}

	pub async fn login(&self, email: &str, password: &str) -> bool {
		self.authenticate("/auth/login", email, password).await
	}

	async fn authenticate(&self, endpoint: &str, email: &str, password: &str) -> bool {
		self.error.set_neq(None);

		let credentials = Credentials::new(email, password);
		let response = self
			.client
			.post::<AuthResponse, _>(endpoint, Some(&credentials))
			.await;

		match (response.data, response.error) {
			(_, Some(error)) => {
				debug!(endpoint, status = response.status, "authentication rejected");
				self.error.set(Some(error));
				false
			}
			(Some(auth), None) => {
				info!(user_id = %auth.user.id, endpoint, "authenticated");
				let session = self.client.session();
				session.set_token(Some(auth.access_token)).await;
				self.user.set(Some(auth.user));
				true
			}
			(None, None) => false,
		}
	}

	/// Ends the session.
	///
	/// The server call is best-effort: the local credential and user are
	/// cleared even if it fails.
	pub async fn logout(&self) {
		let response = self.client.post::<Value, _>("/auth/logout", NO_BODY).await;
		if let Some(error) = response.error {
			warn!(status = response.status, %error, "logout request failed; clearing session locally");
		}

		self.client.session().clear().await;
		self.user.set(None);
		info!("logged out");
	}

	/// Loads the user behind the current credential.
	///
	/// A rejected credential is discarded together with the user.
	pub async fn fetch_current_user(&self) {
		let response = self.client.get::<User>("/auth/me").await;

		match response.data {
			Some(user) if response.error.is_none() => {
				info!(user_id = %user.id, "session restored");
				self.user.set(Some(user));
			}
			_ => {
				debug!(status = response.status, "current user unavailable; dropping credential");
				self.client.session().clear().await;
				self.user.set(None);
			}
		}
	}

	/// Exchanges the refresh cookie for a new access token.
	pub async fn refresh_session(&self) -> bool {
		self.error.set_neq(None);

		let response = self
			.client
			.post::<TokenRefreshResponse, _>("/auth/refresh", NO_BODY)
			.await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return false;
		}
		match response.data {
			Some(refreshed) => {
				debug!("access token refreshed");
				let session = self.client.session();
				session.set_token(Some(refreshed.access_token)).await;
				true
			}
			None => false,
		}
	}

	pub fn clear_error(&self) {
		self.error.set_neq(None);
	}
}

impl fmt::Debug for AuthStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthStore")
			.field("client", &self.client)
			.field("user", &*self.user.lock_ref())
			.field("loading", &self.loading.get())
			.field("error", &*self.error.lock_ref())
			.finish()
	}
}
