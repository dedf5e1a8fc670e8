//! HTTP client for the Taskdeck REST API
//!
//! [`ApiClient`] is the single chokepoint for outbound calls. Every request carries
//! `Content-Type: application/json`, a bearer credential when the [`Session`] holds
//! one, and any cookies the server has set. With a cookie file configured, those
//! cookies are also written to disk and restored by the next client. Every
//! outcome, including transport failures, is folded into an [`ApiResponse`]
//! envelope; nothing is retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use taskdeck_client::{ApiClient, models::TaskListResponse};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8000/api")
//!     .build()?;
//!
//! let response = client.get::<TaskListResponse>("/tasks").await;
//! match response.data {
//!     Some(list) => println!("{} tasks", list.total),
//!     None => eprintln!("failed: {:?} (status {})", response.error, response.status),
//! }
//! # Ok(())
//! # }
//! ```

use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use reqwest::cookie::Jar;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::cookies::CookieFile;
use crate::error::{ApiError, ClientError};
use crate::session::Session;
use crate::settings::{ClientSettings, DEFAULT_API_URL};

/// Message used when a non-2xx response carries no usable `detail`.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Body placeholder for `post`/`put`/`patch` calls that send nothing.
pub const NO_BODY: Option<&()> = None;

/// Uniform result of an API call.
///
/// Exactly one of these shapes is produced:
///
/// | Outcome | `data` | `error` | `status` |
/// |---------|--------|---------|----------|
/// | 204 No Content | `None` | `None` | `204` |
/// | 2xx with body | `Some` | `None` | HTTP status |
/// | non-2xx | `None` | server `detail` or fallback | HTTP status |
/// | no response | `None` | network error | `0` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
	pub data: Option<T>,
	pub error: Option<String>,
	pub status: u16,
}

impl<T> ApiResponse<T> {
	pub fn success(data: T, status: u16) -> Self {
		Self {
			data: Some(data),
			error: None,
			status,
		}
	}

	pub fn no_content() -> Self {
		Self {
			data: None,
			error: None,
			status: StatusCode::NO_CONTENT.as_u16(),
		}
	}

	pub fn failure(error: impl Into<String>, status: u16) -> Self {
		Self {
			data: None,
			error: Some(error.into()),
			status,
		}
	}

	/// A failure where no response was received.
	pub fn network_error(error: impl Into<String>) -> Self {
		Self::failure(error, 0)
	}

	/// Returns true if the call produced no error.
	pub fn is_success(&self) -> bool {
		self.error.is_none()
	}

	/// Converts the envelope into a `Result`, for callers that prefer `?`.
	pub fn into_result(self) -> Result<Option<T>, ApiError> {
		match self.error {
			Some(message) => Err(ApiError {
				status: self.status,
				message,
			}),
			None => Ok(self.data),
		}
	}
}

/// Builder for [`ApiClient`]
///
/// # Example
/// ```rust
/// use taskdeck_client::ApiClient;
/// use std::time::Duration;
///
/// let client = ApiClient::builder()
///     .base_url("http://localhost:8000/api")
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url(), "http://localhost:8000/api");
/// ```
pub struct ApiClientBuilder {
	base_url: String,
	timeout: Option<Duration>,
	user_agent: Option<String>,
	session: Option<Session>,
	cookie_store: bool,
	cookie_file: Option<PathBuf>,
}

impl ApiClientBuilder {
	pub fn new() -> Self {
		Self {
			base_url: DEFAULT_API_URL.to_string(),
			timeout: None,
			user_agent: None,
			session: None,
			cookie_store: true,
			cookie_file: None,
		}
	}

	/// Set the API root every endpoint is appended to
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();
		self
	}

	/// Set the request timeout
	pub fn timeout(mut self, duration: Duration) -> Self {
		self.timeout = Some(duration);
		self
	}

	pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
		self.user_agent = Some(agent.into());
		self
	}

	/// Share an existing session context. Defaults to a fresh in-memory one.
	pub fn session(mut self, session: Session) -> Self {
		self.session = Some(session);
		self
	}

	/// Enable or disable the client-side cookie jar
	pub fn cookie_store(mut self, enabled: bool) -> Self {
		self.cookie_store = enabled;
		self
	}

	/// Persist the cookie jar to `path` so it survives restarts
	///
	/// Ignored when the cookie store is disabled.
	pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.cookie_file = Some(path.into());
		self
	}

	pub fn build(self) -> Result<ApiClient, ClientError> {
		let base_url = self.base_url.trim_end_matches('/').to_string();
		let mut client_builder = reqwest::Client::builder();
		let mut cookies = None;

		if self.cookie_store {
			let jar = Arc::new(Jar::default());
			if let Some(path) = self.cookie_file {
				match Url::parse(&base_url) {
					Ok(url) => cookies = Some(Arc::new(CookieFile::open(path, &jar, &url))),
					Err(e) => {
						tracing::warn!(%base_url, error = %e, "cookie file ignored: bad base URL");
					}
				}
			}
			client_builder = client_builder.cookie_provider(jar);
		}

		if let Some(timeout) = self.timeout {
			client_builder = client_builder.timeout(timeout);
		}
		if let Some(agent) = self.user_agent {
			client_builder = client_builder.user_agent(agent);
		}

		Ok(ApiClient {
			http: client_builder.build()?,
			base_url,
			session: self.session.unwrap_or_else(Session::in_memory),
			cookies,
		})
	}
}

impl Default for ApiClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Client for the Taskdeck API
///
/// Cheap to clone; clones share the connection pool, cookie jar and [`Session`].
#[derive(Debug, Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base_url: String,
	session: Session,
	cookies: Option<Arc<CookieFile>>,
}

impl ApiClient {
	pub fn builder() -> ApiClientBuilder {
		ApiClientBuilder::new()
	}

	/// Build a client from resolved settings and a session context.
	pub fn from_settings(settings: &ClientSettings, session: Session) -> Result<Self, ClientError> {
		settings.validate()?;
		let mut builder = Self::builder()
			.base_url(&settings.api_url)
			.user_agent(&settings.user_agent)
			.session(session)
			.cookie_file(settings.resolved_cookie_path());
		if let Some(timeout) = settings.timeout() {
			builder = builder.timeout(timeout);
		}
		builder.build()
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	/// The on-disk cookie record, if one is configured.
	pub fn cookie_file(&self) -> Option<&CookieFile> {
		self.cookies.as_deref()
	}

	pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
		self.request(Method::GET, endpoint, NO_BODY).await
	}

	pub async fn post<T, B>(&self, endpoint: &str, body: Option<&B>) -> ApiResponse<T>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		self.request(Method::POST, endpoint, body).await
	}

	pub async fn put<T, B>(&self, endpoint: &str, body: Option<&B>) -> ApiResponse<T>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		self.request(Method::PUT, endpoint, body).await
	}

	pub async fn patch<T, B>(&self, endpoint: &str, body: Option<&B>) -> ApiResponse<T>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		self.request(Method::PATCH, endpoint, body).await
	}

	pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
		self.request(Method::DELETE, endpoint, NO_BODY).await
	}

	fn url(&self, endpoint: &str) -> String {
		if endpoint.starts_with('/') {
			format!("{}{}", self.base_url, endpoint)
		} else {
			format!("{}/{}", self.base_url, endpoint)
		}
	}

	async fn request<T, B>(
		&self,
		method: Method,
		endpoint: &str,
		body: Option<&B>,
	) -> ApiResponse<T>
	where
		T: DeserializeOwned,
		B: Serialize + ?Sized,
	{
		let mut request = self
			.http
			.request(method.clone(), self.url(endpoint))
			.header(CONTENT_TYPE, "application/json");

		if let Some(token) = self.session.token().await {
			request = request.bearer_auth(token);
		}

		if let Some(body) = body {
			match serde_json::to_vec(body) {
				Ok(bytes) => request = request.body(bytes),
				Err(e) => {
					return ApiResponse::network_error(format!(
						"Failed to serialize request body: {}",
						e
					));
				}
			}
		}

		let response = match request.send().await {
			Ok(response) => response,
			Err(e) => {
				tracing::warn!(%method, endpoint, error = %e, "api request got no response");
				return ApiResponse::network_error(transport_message(&e));
			}
		};

		let status = response.status();
		tracing::debug!(%method, endpoint, status = status.as_u16(), "api request completed");

		if let Some(cookies) = &self.cookies {
			cookies.record(response.headers()).await;
		}

		if status == StatusCode::NO_CONTENT {
			return ApiResponse::no_content();
		}

		// An unreadable or non-JSON body is treated as absent.
		let payload: Option<Value> = match response.bytes().await {
			Ok(bytes) => serde_json::from_slice(&bytes).ok(),
			Err(e) => {
				tracing::debug!(endpoint, error = %e, "failed to read response body");
				None
			}
		};

		let code = status.as_u16();
		if !status.is_success() {
			return ApiResponse::failure(error_message(payload.as_ref()), code);
		}

		match serde_json::from_value::<T>(payload.unwrap_or(Value::Null)) {
			Ok(data) => ApiResponse::success(data, code),
			Err(e) => ApiResponse::failure(format!("Invalid response body: {}", e), code),
		}
	}
}

fn transport_message(error: &reqwest::Error) -> String {
	if error.is_timeout() {
		"Network error: request timed out".to_string()
	} else {
		format!("Network error: {}", error)
	}
}

/// Extracts the server's `detail`, which is either a message string or a list of
/// validation errors carrying `msg` fields.
fn error_message(payload: Option<&Value>) -> String {
	match payload.and_then(|p| p.get("detail")) {
		Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
		Some(Value::Array(items)) => {
			let messages: Vec<&str> = items
				.iter()
				.filter_map(|item| item.get("msg").and_then(Value::as_str))
				.collect();
			if messages.is_empty() {
				DEFAULT_ERROR_MESSAGE.to_string()
			} else {
				messages.join("; ")
			}
		}
		_ => DEFAULT_ERROR_MESSAGE.to_string(),
	}
}
