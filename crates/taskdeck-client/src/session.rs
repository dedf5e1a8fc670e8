//! Session credential context
//!
//! The bearer token that authenticates API calls lives in a [`Session`], an
//! explicitly passed handle shared by the [`ApiClient`](crate::ApiClient) and the
//! stores built on top of it. Persistence is delegated to a [`TokenStorage`]
//! backend so the same code runs against a file on disk or plain memory in tests.
//!
//! ## Example
//!
//! ```rust
//! use taskdeck_client::session::{InMemoryTokenStorage, Session};
//!
//! # async fn example() {
//! let session = Session::new(InMemoryTokenStorage::new());
//! assert!(session.token().await.is_none());
//!
//! session.set_token(Some("abc123".to_string())).await;
//! assert_eq!(session.token().await.as_deref(), Some("abc123"));
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;

/// Persistence backend for the session credential.
#[async_trait]
pub trait TokenStorage: Send + Sync {
	/// Load the stored token, if any.
	async fn load(&self) -> Result<Option<String>, StorageError>;

	/// Persist a token, replacing any previous value.
	async fn save(&self, token: &str) -> Result<(), StorageError>;

	/// Remove the stored token.
	async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory token storage
///
/// Tokens are lost when the process exits. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStorage {
	slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryTokenStorage {
	pub fn new() -> Self {
		Self::default()
	}

	/// Storage pre-populated with a token, as if left over from an earlier run.
	pub fn with_token(token: impl Into<String>) -> Self {
		Self {
			slot: Arc::new(Mutex::new(Some(token.into()))),
		}
	}

	/// Current stored value, bypassing any [`Session`] cache.
	pub fn peek(&self) -> Option<String> {
		self.slot.lock().clone()
	}
}

#[async_trait]
impl TokenStorage for InMemoryTokenStorage {
	async fn load(&self) -> Result<Option<String>, StorageError> {
		Ok(self.slot.lock().clone())
	}

	async fn save(&self, token: &str) -> Result<(), StorageError> {
		*self.slot.lock() = Some(token.to_string());
		Ok(())
	}

	async fn clear(&self) -> Result<(), StorageError> {
		self.slot.lock().take();
		Ok(())
	}
}

/// File-backed token storage
///
/// The token is kept as the sole content of a single file, readable by the
/// owner only. Writes go to a sibling temp file that is then renamed over the
/// target.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
	path: PathBuf,
}

impl FileTokenStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
	async fn load(&self) -> Result<Option<String>, StorageError> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(content) => {
				let token = content.trim();
				Ok((!token.is_empty()).then(|| token.to_string()))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn save(&self, token: &str) -> Result<(), StorageError> {
		write_private(&self.path, token.as_bytes()).await
	}

	async fn clear(&self) -> Result<(), StorageError> {
		remove_if_exists(&self.path).await
	}
}

/// Atomically replaces `path` with `contents`, readable by the owner only.
///
/// Missing parent directories are created. The data goes to a sibling temp
/// file that is renamed over the target once its mode has been restricted.
pub(crate) async fn write_private(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		tokio::fs::create_dir_all(parent).await?;
	}

	let tmp_path = path.with_extension("tmp");
	let result = async {
		tokio::fs::write(&tmp_path, contents).await?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
		}
		tokio::fs::rename(&tmp_path, path).await
	}
	.await;

	if let Err(e) = result {
		let _ = tokio::fs::remove_file(&tmp_path).await;
		return Err(e.into());
	}
	Ok(())
}

pub(crate) async fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
	match tokio::fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e.into()),
	}
}

#[derive(Debug, Clone)]
enum Cached {
	Unloaded,
	Loaded(Option<String>),
}

/// Shared session context holding the current bearer credential.
///
/// The first [`token`](Session::token) call reads the storage backend; the value
/// is then cached in memory for the lifetime of the context. Storage failures are
/// logged and otherwise ignored: the in-memory value stays authoritative.
#[derive(Clone)]
pub struct Session {
	storage: Arc<dyn TokenStorage>,
	cached: Arc<RwLock<Cached>>,
}

impl Session {
	pub fn new(storage: impl TokenStorage + 'static) -> Self {
		Self::from_arc(Arc::new(storage))
	}

	pub fn from_arc(storage: Arc<dyn TokenStorage>) -> Self {
		Self {
			storage,
			cached: Arc::new(RwLock::new(Cached::Unloaded)),
		}
	}

	/// A session that never touches durable storage.
	pub fn in_memory() -> Self {
		Self::new(InMemoryTokenStorage::new())
	}

	/// Returns the current credential, loading it from storage on first use.
	pub async fn token(&self) -> Option<String> {
		let snapshot = self.cached.read().clone();
		if let Cached::Loaded(token) = snapshot {
			return token;
		}

		let loaded = match self.storage.load().await {
			Ok(token) => token,
			Err(e) => {
				tracing::warn!(error = %e, "failed to load session token");
				None
			}
		};

		let mut cached = self.cached.write();
		// A concurrent set_token wins over the value read from storage.
		if let Cached::Loaded(token) = &*cached {
			return token.clone();
		}
		*cached = Cached::Loaded(loaded.clone());
		loaded
	}

	/// Returns true if a credential is present.
	pub async fn has_token(&self) -> bool {
		self.token().await.is_some()
	}

	/// Replaces (`Some`) or clears (`None`) the credential in memory and storage.
	pub async fn set_token(&self, token: Option<String>) {
		*self.cached.write() = Cached::Loaded(token.clone());

		let result = match token.as_deref() {
			Some(token) => self.storage.save(token).await,
			None => self.storage.clear().await,
		};
		if let Err(e) = result {
			tracing::warn!(error = %e, "failed to persist session token");
		}
	}

	/// Clears the credential.
	pub async fn clear(&self) {
		self.set_token(None).await;
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = match &*self.cached.read() {
			Cached::Unloaded => "unloaded",
			Cached::Loaded(Some(_)) => "present",
			Cached::Loaded(None) => "absent",
		};
		f.debug_struct("Session").field("token", &state).finish()
	}
}
