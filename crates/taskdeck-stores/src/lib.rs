//! # Taskdeck Stores
//!
//! Client-side state for Taskdeck, kept in sync with the API.
//!
//! - [`AuthStore`]: the signed-in user and session credential
//! - [`TaskStore`]: the user's tasks, with a filtered view
//! - [`AdminStore`]: account listing and activation for admins
//!
//! Each store is a cheap `Clone` handle over `futures-signals`
//! [`Mutable`](futures_signals::signal::Mutable) and
//! [`MutableVec`](futures_signals::signal_vec::MutableVec) cells, so every
//! field can be observed through a signal (`user_signal`, `tasks_signal`, ...)
//! as well as read directly. Stores never return `Err`: every call reports
//! success as a `bool` (or an `Option`) and leaves the server's message in the
//! store's `error` slot.
//!
//! ## Observing changes
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use futures_signals::signal::SignalExt;
//! use taskdeck_client::ApiClient;
//! use taskdeck_stores::AuthStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let auth = AuthStore::new(ApiClient::builder().build()?);
//! let mut users = auth.user_signal().to_stream();
//!
//! tokio::spawn(async move {
//!     while let Some(user) = users.next().await {
//!         println!("signed in as {:?}", user.map(|u| u.email));
//!     }
//! });
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod auth;
pub mod tasks;

pub use admin::AdminStore;
pub use auth::AuthStore;
pub use tasks::{TaskFilter, TaskStore};

pub use futures_signals;
