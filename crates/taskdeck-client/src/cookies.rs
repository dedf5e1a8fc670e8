//! Cookies that outlive the process
//!
//! The refresh token travels as a cookie. reqwest's [`Jar`] forgets it when the
//! process exits, so a [`CookieFile`] records every cookie the API sets in a
//! small JSON map (owner-readable only) and replays it into the jar of the next
//! client built over the same file.
//!
//! Only `name=value` and expiry via `Max-Age` are tracked; replayed cookies are
//! scoped to the API host with `Path=/`.

use http::HeaderMap;
use http::header::SET_COOKIE;
use reqwest::cookie::Jar;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use url::Url;

use crate::error::StorageError;
use crate::session::{remove_if_exists, write_private};

type CookieMap = BTreeMap<String, String>;

/// JSON-backed record of the cookies set by the API.
pub struct CookieFile {
	path: PathBuf,
	values: Mutex<CookieMap>,
}

impl CookieFile {
	/// Reads `path` and seeds `jar` with its cookies for `url`.
	///
	/// An unreadable or corrupt file is logged and treated as empty; it is
	/// overwritten by the next cookie change.
	pub fn open(path: impl Into<PathBuf>, jar: &Jar, url: &Url) -> Self {
		let path = path.into();
		let values = match read_values(&path) {
			Ok(values) => values,
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "cookie file unreadable");
				CookieMap::new()
			}
		};

		for (name, value) in &values {
			jar.add_cookie_str(&format!("{}={}; Path=/", name, value), url);
		}
		tracing::debug!(path = %path.display(), count = values.len(), "cookies restored");

		Self {
			path,
			values: Mutex::new(values),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Names of the cookies currently recorded.
	pub async fn names(&self) -> Vec<String> {
		self.values.lock().await.keys().cloned().collect()
	}

	/// Applies the `Set-Cookie` headers of a response and persists any change.
	///
	/// Persistence failures are logged; the in-process jar is unaffected.
	pub async fn record(&self, headers: &HeaderMap) {
		let mut values = self.values.lock().await;
		let mut changed = false;

		for header in headers.get_all(SET_COOKIE) {
			let Some((name, value)) = header.to_str().ok().and_then(parse_set_cookie) else {
				continue;
			};
			changed |= match value {
				Some(value) => values.insert(name, value.clone()).as_ref() != Some(&value),
				None => values.remove(&name).is_some(),
			};
		}

		if !changed {
			return;
		}
		// The lock is held across the write so concurrent responses land in order.
		let result = if values.is_empty() {
			remove_if_exists(&self.path).await
		} else {
			match serde_json::to_vec_pretty(&*values) {
				Ok(bytes) => write_private(&self.path, &bytes).await,
				Err(e) => Err(StorageError::Unavailable(e.to_string())),
			}
		};
		if let Err(e) = result {
			tracing::warn!(path = %self.path.display(), error = %e, "failed to persist cookies");
		}
	}
}

impl fmt::Debug for CookieFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CookieFile")
			.field("path", &self.path)
			.finish_non_exhaustive()
	}
}

fn read_values(path: &Path) -> Result<CookieMap, StorageError> {
	match std::fs::read(path) {
		Ok(bytes) => {
			serde_json::from_slice(&bytes).map_err(|e| StorageError::Unavailable(e.to_string()))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CookieMap::new()),
		Err(e) => Err(e.into()),
	}
}

/// Splits a `Set-Cookie` value into its name and value.
///
/// The value is `None` when the header deletes the cookie: an empty value or a
/// non-positive `Max-Age`.
fn parse_set_cookie(header: &str) -> Option<(String, Option<String>)> {
	let mut parts = header.split(';');
	let (name, value) = parts.next()?.split_once('=')?;
	let name = name.trim();
	if name.is_empty() {
		return None;
	}

	let expired = parts.any(|attribute| {
		attribute.split_once('=').is_some_and(|(key, value)| {
			key.trim().eq_ignore_ascii_case("max-age")
				&& value.trim().parse::<i64>().is_ok_and(|secs| secs <= 0)
		})
	});
	let value = value.trim();

	let value = (!expired && !value.is_empty()).then(|| value.to_string());
	Some((name.to_string(), value))
}
