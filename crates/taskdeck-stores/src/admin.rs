//! Admin store
//!
//! User management for accounts with the admin role. The server enforces the
//! role; a non-admin caller simply sees the rejection in `error`.

use futures_signals::signal::{Mutable, MutableSignal, MutableSignalCloned};
use futures_signals::signal_vec::{MutableSignalVec, MutableVec};
use std::fmt;
use taskdeck_client::ApiClient;
use taskdeck_client::models::{
	AdminUser, AdminUserList, Page, UserStatusUpdate, admin_users_endpoint,
};
use tracing::{debug, info};
use uuid::Uuid;

fn user_endpoint(id: Uuid) -> String {
	format!("/admin/users/{}", id)
}

#[derive(Clone)]
pub struct AdminStore {
	client: ApiClient,
	users: MutableVec<AdminUser>,
	total: Mutable<usize>,
	loading: Mutable<bool>,
	error: Mutable<Option<String>>,
}

impl AdminStore {
	pub fn new(client: ApiClient) -> Self {
		Self {
			client,
			users: MutableVec::new(),
			total: Mutable::new(0),
			loading: Mutable::new(false),
			error: Mutable::new(None),
		}
	}

	pub fn users(&self) -> Vec<AdminUser> {
		self.users.lock_ref().to_vec()
	}

	pub fn total(&self) -> usize {
		self.total.get()
	}

	pub fn is_loading(&self) -> bool {
		self.loading.get()
	}

	pub fn error(&self) -> Option<String> {
		self.error.get_cloned()
	}

	pub fn clear_error(&self) {
		self.error.set_neq(None);
	}

	pub fn users_signal(&self) -> MutableSignalVec<AdminUser> {
		self.users.signal_vec_cloned()
	}

	pub fn total_signal(&self) -> MutableSignal<usize> {
		self.total.signal()
	}

	pub fn loading_signal(&self) -> MutableSignal<bool> {
		self.loading.signal()
	}

	pub fn error_signal(&self) -> MutableSignalCloned<Option<String>> {
		self.error.signal_cloned()
	}

	/// Loads one page of users, replacing the listing.
	pub async fn fetch_users(&self, page: Page) {
		self.loading.set_neq(true);
		self.error.set_neq(None);

		let endpoint = admin_users_endpoint(page);
		let response = self.client.get::<AdminUserList>(&endpoint).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
		} else if let Some(list) = response.data {
			debug!(count = list.users.len(), total = list.total, "users fetched");
			self.users.lock_mut().replace_cloned(list.users);
			self.total.set(list.total);
		}

		self.loading.set_neq(false);
	}

	/// Loads a single user, updating the listing if the user is in it.
	pub async fn fetch_user(&self, id: Uuid) -> Option<AdminUser> {
		self.error.set_neq(None);

		let response = self.client.get::<AdminUser>(&user_endpoint(id)).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return None;
		}
		let user = response.data?;
		self.replace(user.clone());
		Some(user)
	}

	/// Activates or deactivates an account.
	pub async fn set_user_active(&self, id: Uuid, is_active: bool) -> bool {
		self.error.set_neq(None);

		let endpoint = user_endpoint(id);
		let update = UserStatusUpdate { is_active };
		let response = self
			.client
			.patch::<AdminUser, _>(&endpoint, Some(&update))
			.await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return false;
		}
		match response.data {
			Some(user) => {
				info!(user_id = %id, is_active, "account status changed");
				self.replace(user);
				true
			}
			None => false,
		}
	}

	fn replace(&self, user: AdminUser) {
		let mut users = self.users.lock_mut();
		if let Some(index) = users.iter().position(|u| u.user.id == user.user.id) {
			users.set_cloned(index, user);
		}
	}
}

impl fmt::Debug for AdminStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AdminStore")
			.field("client", &self.client)
			.field("users", &self.users.lock_ref().len())
			.field("total", &self.total.get())
			.field("error", &*self.error.lock_ref())
			.finish_non_exhaustive()
	}
}
