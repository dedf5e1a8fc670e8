//! Layered client settings
//!
//! Settings are resolved in priority order (environment variables > TOML file > defaults):
//!
//! | Key | Environment variable | Default |
//! |-----|----------------------|---------|
//! | `api_url` | `TASKDECK_API_URL` | `http://localhost:8000/api` |
//! | `timeout_secs` | `TASKDECK_TIMEOUT_SECS` | none |
//! | `token_path` | `TASKDECK_TOKEN_PATH` | `<data dir>/taskdeck/token` |
//! | `cookie_path` | `TASKDECK_COOKIE_PATH` | `cookies.json` next to the token |
//! | `user_agent` | `TASKDECK_USER_AGENT` | `taskdeck/<version>` |
//!
//! ## Example
//!
//! ```rust
//! use taskdeck_client::settings::ClientSettings;
//!
//! let settings = ClientSettings::from_toml_str(r#"
//! api_url = "https://tasks.example.com/api"
//! timeout_secs = 10
//! "#).unwrap();
//! assert_eq!(settings.api_url, "https://tasks.example.com/api");
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SettingsError;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TASKDECK_";

/// API root used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Connection and persistence settings for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
	/// Base URL every endpoint path is appended to.
	pub api_url: String,
	/// Per-request timeout. `None` waits indefinitely.
	pub timeout_secs: Option<u64>,
	/// Where the session token is persisted.
	pub token_path: Option<PathBuf>,
	/// Where cookies set by the API (the refresh token) are persisted.
	pub cookie_path: Option<PathBuf>,
	pub user_agent: String,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			api_url: DEFAULT_API_URL.to_string(),
			timeout_secs: None,
			token_path: None,
			cookie_path: None,
			user_agent: concat!("taskdeck/", env!("CARGO_PKG_VERSION")).to_string(),
		}
	}
}

impl ClientSettings {
	/// Resolve settings from an optional TOML file and the process environment.
	pub fn load(config_path: Option<&Path>) -> Result<Self, SettingsError> {
		let base = match config_path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		let settings = base.apply_env()?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Parse a TOML document. Missing keys fall back to their defaults.
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Apply `TASKDECK_*` overrides from the process environment.
	pub fn apply_env(self) -> Result<Self, SettingsError> {
		self.apply_env_with(|key| std::env::var(key).ok())
	}

	/// Apply `TASKDECK_*` overrides using a custom lookup.
	pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

		if let Some(url) = var("API_URL") {
			self.api_url = url;
		}
		if let Some(raw) = var("TIMEOUT_SECS") {
			let secs = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| SettingsError::InvalidValue {
					key: format!("{}TIMEOUT_SECS", ENV_PREFIX),
					value: raw.clone(),
				})?;
			self.timeout_secs = Some(secs);
		}
		if let Some(path) = var("TOKEN_PATH") {
			self.token_path = Some(PathBuf::from(path));
		}
		if let Some(path) = var("COOKIE_PATH") {
			self.cookie_path = Some(PathBuf::from(path));
		}
		if let Some(agent) = var("USER_AGENT") {
			self.user_agent = agent;
		}
		Ok(self)
	}

	/// Check that `api_url` is an absolute http(s) URL.
	pub fn validate(&self) -> Result<(), SettingsError> {
		let parsed = url::Url::parse(&self.api_url).map_err(|source| SettingsError::InvalidUrl {
			url: self.api_url.clone(),
			source,
		})?;
		match parsed.scheme() {
			"http" | "https" => Ok(()),
			other => Err(SettingsError::InvalidValue {
				key: "api_url".to_string(),
				value: format!("unsupported scheme `{}`", other),
			}),
		}
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_secs.map(Duration::from_secs)
	}

	/// The configured token path, or `<data dir>/taskdeck/token`.
	pub fn resolved_token_path(&self) -> PathBuf {
		if let Some(path) = &self.token_path {
			return path.clone();
		}
		dirs::data_dir()
			.unwrap_or_else(|| PathBuf::from("."))
			.join("taskdeck")
			.join("token")
	}

	/// The configured cookie path, or `cookies.json` beside the token file.
	pub fn resolved_cookie_path(&self) -> PathBuf {
		match &self.cookie_path {
			Some(path) => path.clone(),
			None => self.resolved_token_path().with_file_name("cookies.json"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::collections::HashMap;

	#[rstest]
	fn test_defaults() {
		let settings = ClientSettings::default();
		assert_eq!(settings.api_url, DEFAULT_API_URL);
		assert!(settings.timeout().is_none());
		assert!(settings.user_agent.starts_with("taskdeck/"));
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	fn test_partial_toml_keeps_defaults() {
		let settings = ClientSettings::from_toml_str("timeout_secs = 5").unwrap();
		assert_eq!(settings.api_url, DEFAULT_API_URL);
		assert_eq!(settings.timeout(), Some(Duration::from_secs(5)));
	}

	#[rstest]
	#[case("not a url")]
	#[case("ftp://example.com/api")]
	fn test_invalid_api_url_rejected(#[case] url: &str) {
		let content = format!("api_url = \"{}\"", url);
		assert!(ClientSettings::from_toml_str(&content).is_err());
	}

	#[rstest]
	fn test_env_overrides_file_values() {
		let env: HashMap<&str, &str> = HashMap::from([
			("TASKDECK_API_URL", "https://override.example.com/api"),
			("TASKDECK_TIMEOUT_SECS", "30"),
			("TASKDECK_TOKEN_PATH", "/tmp/taskdeck-token"),
		]);
		let settings = ClientSettings::from_toml_str("api_url = \"http://file.example.com\"")
			.unwrap()
			.apply_env_with(|key| env.get(key).map(|v| v.to_string()))
			.unwrap();

		assert_eq!(settings.api_url, "https://override.example.com/api");
		assert_eq!(settings.timeout_secs, Some(30));
		assert_eq!(
			settings.resolved_token_path(),
			PathBuf::from("/tmp/taskdeck-token")
		);
	}

	#[rstest]
	fn test_bad_timeout_env_is_an_error() {
		let result = ClientSettings::default()
			.apply_env_with(|key| (key == "TASKDECK_TIMEOUT_SECS").then(|| "soon".to_string()));
		assert!(matches!(
			result,
			Err(SettingsError::InvalidValue { ref value, .. }) if value == "soon"
		));
	}

	#[rstest]
	fn test_default_token_path_ends_with_taskdeck_token() {
		let path = ClientSettings::default().resolved_token_path();
		assert!(path.ends_with("taskdeck/token"));
	}

	#[rstest]
	fn test_cookie_path_follows_token_path() {
		let settings = ClientSettings {
			token_path: Some(PathBuf::from("/var/lib/taskdeck/token")),
			..ClientSettings::default()
		};
		assert_eq!(
			settings.resolved_cookie_path(),
			PathBuf::from("/var/lib/taskdeck/cookies.json")
		);

		let env = |key: &str| (key == "TASKDECK_COOKIE_PATH").then(|| "/tmp/jar.json".to_string());
		let settings = settings.apply_env_with(env).unwrap();
		assert_eq!(
			settings.resolved_cookie_path(),
			PathBuf::from("/tmp/jar.json")
		);
	}

	#[rstest]
	fn test_load_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("taskdeck.toml");
		std::fs::write(&path, "api_url = \"https://tasks.example.com/api\"\n").unwrap();

		let settings = ClientSettings::from_file(&path).unwrap();
		assert_eq!(settings.api_url, "https://tasks.example.com/api");
	}

	#[rstest]
	#[serial(taskdeck_env)]
	fn test_load_reads_process_environment() {
		// SAFETY: serialized with every other test touching TASKDECK_* variables.
		unsafe { std::env::set_var("TASKDECK_USER_AGENT", "env-agent/1.0") };
		let settings = ClientSettings::load(None);
		unsafe { std::env::remove_var("TASKDECK_USER_AGENT") };

		assert_eq!(settings.unwrap().user_agent, "env-agent/1.0");
	}
}
