//! Error types for the Taskdeck client.
//!
//! Network and server failures never surface as `Err` from [`ApiClient`](crate::ApiClient);
//! they travel inside [`ApiResponse`](crate::ApiResponse). The enums here cover the
//! remaining concerns: token persistence, settings loading, and callers that want to
//! convert an envelope into a `Result`.

use thiserror::Error;

/// Errors raised by a [`TokenStorage`](crate::session::TokenStorage) backend.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Storage backend unavailable: {0}")]
	Unavailable(String),
}

/// Errors raised while constructing an [`ApiClient`](crate::ApiClient).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Failed to build HTTP client: {0}")]
	Build(#[from] reqwest::Error),

	#[error("Settings error: {0}")]
	Settings(#[from] SettingsError),
}

/// Errors raised while loading [`ClientSettings`](crate::settings::ClientSettings).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid API URL `{url}`: {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("Invalid value for {key}: {value}")]
	InvalidValue { key: String, value: String },
}

/// A failed API call, produced by [`ApiResponse::into_result`](crate::ApiResponse::into_result).
///
/// `status` is `0` when no response was received at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
	pub status: u16,
	pub message: String,
}

impl ApiError {
	/// Returns true if the request never reached the server.
	pub fn is_network(&self) -> bool {
		self.status == 0
	}

	/// Returns true if the server rejected the credential.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}
