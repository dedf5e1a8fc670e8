//! Wire models exchanged with the Taskdeck API.
//!
//! Field names follow the server's JSON exactly (`snake_case`), so every type
//! here round-trips through `serde_json` without renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	#[default]
	User,
	Admin,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::User => f.write_str("user"),
			Role::Admin => f.write_str("admin"),
		}
	}
}

/// The authenticated account as returned by `/auth/me`, `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: Uuid,
	pub email: String,
	pub role: Role,
	pub is_active: bool,
	#[serde(with = "timestamp")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "timestamp::option", default)]
	pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
	/// Returns true if this account has the admin role.
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

/// Login/register request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

fn default_token_type() -> String {
	"bearer".to_string()
}

/// Response of `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
	pub access_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
	pub user: User,
}

/// Response of `/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
	pub access_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
}

/// A to-do item owned by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
	pub id: Uuid,
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	pub is_completed: bool,
	#[serde(with = "timestamp")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "timestamp")]
	pub updated_at: DateTime<Utc>,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreate {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl TaskCreate {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}
}

/// Body of `PUT /tasks/:id`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_completed: Option<bool>,
}

impl TaskUpdate {
	/// An update that only sets the completion flag.
	pub fn completed(is_completed: bool) -> Self {
		Self {
			is_completed: Some(is_completed),
			..Self::default()
		}
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Returns true if no field would be sent.
	pub fn is_empty(&self) -> bool {
		self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
	}
}

/// Response of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListResponse {
	pub tasks: Vec<Task>,
	pub total: usize,
}

/// Query parameters for `GET /tasks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskQuery {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_completed: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub offset: Option<u32>,
}

impl TaskQuery {
	pub fn completed(is_completed: Option<bool>) -> Self {
		Self {
			is_completed,
			..Self::default()
		}
	}

	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = Some(offset);
		self
	}

	/// Builds the `/tasks` endpoint, appending a query string only when a parameter is set.
	pub fn endpoint(&self) -> String {
		with_query("/tasks", self)
	}
}

/// A user row in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
	#[serde(flatten)]
	pub user: User,
	pub task_count: u64,
}

/// Response of `GET /admin/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserList {
	pub users: Vec<AdminUser>,
	pub total: usize,
}

/// Body of `PATCH /admin/users/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatusUpdate {
	pub is_active: bool,
}

/// `limit`/`offset` pair for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
	pub limit: u32,
	pub offset: u32,
}

impl Default for Page {
	fn default() -> Self {
		Self {
			limit: 50,
			offset: 0,
		}
	}
}

fn with_query<Q: Serialize>(path: &str, query: &Q) -> String {
	match serde_urlencoded::to_string(query) {
		Ok(qs) if !qs.is_empty() => format!("{}?{}", path, qs),
		Ok(_) => path.to_string(),
		Err(e) => {
			tracing::warn!(error = %e, path, "failed to encode query string");
			path.to_string()
		}
	}
}

/// Builds `/admin/users?limit=..&offset=..`.
pub fn admin_users_endpoint(page: Page) -> String {
	with_query("/admin/users", &page)
}

/// Timestamp (de)serialization tolerant of offset-less values.
///
/// The server may emit `2024-05-01T10:00:00.123456` without an offset; those
/// are read as UTC. Output is always RFC 3339.
pub mod timestamp {
	use chrono::{DateTime, NaiveDateTime, Utc};
	use serde::{Deserialize, Deserializer, Serializer, de};

	pub fn parse(value: &str) -> Option<DateTime<Utc>> {
		if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
			return Some(dt.with_timezone(&Utc));
		}
		NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
			.ok()
			.map(|naive| naive.and_utc())
	}

	pub fn serialize<S: Serializer>(
		value: &DateTime<Utc>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_rfc3339())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<DateTime<Utc>, D::Error> {
		let raw = String::deserialize(deserializer)?;
		parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
	}

	pub mod option {
		use chrono::{DateTime, Utc};
		use serde::{Deserialize, Deserializer, Serializer, de};

		pub fn serialize<S: Serializer>(
			value: &Option<DateTime<Utc>>,
			serializer: S,
		) -> Result<S::Ok, S::Error> {
			match value {
				Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
				None => serializer.serialize_none(),
			}
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(
			deserializer: D,
		) -> Result<Option<DateTime<Utc>>, D::Error> {
			match Option::<String>::deserialize(deserializer)? {
				Some(raw) => super::parse(&raw)
					.map(Some)
					.ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
				None => Ok(None),
			}
		}
	}
}
