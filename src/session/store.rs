//! Session persistence backends.
//!
//! The persisted form is a small key-value document: the token, the user
//! object serialized to a string, and the role. Reading it back at startup
//! restores the session without a fresh login.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::session::Session;

/// Storage backend for the persisted session.
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any.
    fn load(&self) -> ApiResult<Option<Session>>;

    /// Persist a session, replacing whatever was stored.
    fn save(&self, session: &Session) -> ApiResult<()>;

    /// Remove the persisted session.
    fn clear(&self) -> ApiResult<()>;
}

/// On-disk key-value entries, mirroring browser local-storage layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredEntries {
    token: Option<String>,
    user: Option<String>,
    role: String,
}

/// JSON-file-backed session store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_err(e: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(e.to_string())
}

impl SessionStore for FileStore {
    fn load(&self) -> ApiResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(storage_err)?;
        let entries: StoredEntries = serde_json::from_str(&content).map_err(storage_err)?;

        let user = entries
            .user
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(storage_err)?;

        Ok(Some(Session {
            token: entries.token,
            user,
            role: entries.role,
        }))
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        let entries = StoredEntries {
            token: session.token.clone(),
            user: session
                .user
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(storage_err)?,
            role: session.role.clone(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let content = serde_json::to_string_pretty(&entries).map_err(storage_err)?;
        std::fs::write(&self.path, content).map_err(storage_err)?;
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(e)),
        }
    }
}

/// In-memory store, mainly for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> ApiResult<Option<Session>> {
        Ok(self.inner.lock().expect("store poisoned").clone())
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        *self.inner.lock().expect("store poisoned") = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        *self.inner.lock().expect("store poisoned") = None;
        Ok(())
    }
}
