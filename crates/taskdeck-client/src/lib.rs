//! # Taskdeck Client
//!
//! HTTP plumbing for the Taskdeck task-tracking API.
//!
//! ## Modules
//!
//! - [`client`]: [`ApiClient`] and the [`ApiResponse`] envelope
//! - [`session`]: the bearer credential context and its storage backends
//! - [`cookies`]: on-disk record of the cookies the API sets (the refresh token)
//! - [`models`]: wire types (`User`, `Task`, request/response bodies)
//! - [`settings`]: layered configuration (defaults, TOML, `TASKDECK_*` env)
//! - [`error`]: error enums for the non-envelope failure paths
//!
//! ## Example
//!
//! ```rust,no_run
//! use taskdeck_client::{ApiClient, Session, session::FileTokenStorage, settings::ClientSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ClientSettings::load(None)?;
//! let session = Session::new(FileTokenStorage::new(settings.resolved_token_path()));
//! let client = ApiClient::from_settings(&settings, session)?;
//!
//! let me = client.get::<taskdeck_client::models::User>("/auth/me").await;
//! println!("status {}", me.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cookies;
pub mod error;
pub mod models;
pub mod session;
pub mod settings;

pub use client::{ApiClient, ApiClientBuilder, ApiResponse, DEFAULT_ERROR_MESSAGE, NO_BODY};
pub use cookies::CookieFile;
pub use error::{ApiError, ClientError, SettingsError, StorageError};
pub use models::{
	AdminUser, AdminUserList, AuthResponse, Credentials, Page, Role, Task, TaskCreate,
	TaskListResponse, TaskQuery, TaskUpdate, TokenRefreshResponse, User, UserStatusUpdate,
};
pub use session::{FileTokenStorage, InMemoryTokenStorage, Session, TokenStorage};
pub use settings::ClientSettings;
