//! # Taskdeck
//!
//! Client library for the Taskdeck task-tracking service.
//!
//! Taskdeck talks to a REST backend that owns accounts and tasks. This crate
//! bundles the pieces a front end needs on top of it:
//!
//! - **Client**: [`ApiClient`](client::ApiClient) sends JSON requests with the
//!   session's bearer token and folds every outcome into an
//!   [`ApiResponse`](client::ApiResponse) envelope. It never returns `Err` for
//!   network or server failures.
//! - **Session**: [`Session`](client::Session) caches the access token and
//!   persists it through a pluggable [`TokenStorage`](client::TokenStorage).
//! - **Stores**: [`AuthStore`](stores::AuthStore), [`TaskStore`](stores::TaskStore)
//!   and [`AdminStore`](stores::AdminStore) keep `futures-signals` state in
//!   step with the server.
//!
//! ## Feature Flags
//!
//! - `stores` (default) - reactive stores on top of the client
//!
//! Build with `default-features = false` for the API client, session context
//! and wire models only.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use taskdeck::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8000/api")
//!     .session(Session::new(FileTokenStorage::new("/tmp/taskdeck-token")))
//!     .build()?;
//!
//! let auth = AuthStore::new(client.clone());
//! auth.init().await;
//! if !auth.is_authenticated() {
//!     auth.login("alice@example.com", "secret").await;
//! }
//!
//! let tasks = TaskStore::new(client);
//! tasks.fetch_tasks(None).await;
//! tasks.create_task(TaskCreate::new("Buy milk")).await;
//! tasks.set_filter(TaskFilter::Active);
//! for task in tasks.filtered_tasks() {
//!     println!("{}", task.title);
//! }
//! # Ok(())
//! # }
//! ```

pub use taskdeck_client as client;

#[cfg(feature = "stores")]
pub use taskdeck_stores as stores;

pub use taskdeck_client::models;

/// Commonly used types
pub mod prelude {
	pub use crate::client::{
		ApiClient, ApiClientBuilder, ApiError, ApiResponse, ClientSettings, CookieFile,
		FileTokenStorage, InMemoryTokenStorage, NO_BODY, Session, TokenStorage,
	};
	pub use crate::models::{
		AdminUser, Page, Role, Task, TaskCreate, TaskQuery, TaskUpdate, User,
	};

	#[cfg(feature = "stores")]
	pub use crate::stores::{AdminStore, AuthStore, TaskFilter, TaskStore};

	#[cfg(feature = "stores")]
	pub use crate::stores::futures_signals::signal::SignalExt;
	#[cfg(feature = "stores")]
	pub use crate::stores::futures_signals::signal_vec::SignalVecExt;
}
