use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::Credential;
use super::error::StoreError;

/// Process-wide slot holding the current [`Credential`].
///
/// A single last-write-wins slot: `set` replaces both tokens together and
/// `get` never observes a pair assembled from two different writes.
/// Implementations must not perform network or UI side effects.
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` if absent or incomplete.
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential);
    fn clear(&self);
}

/// Volatile store; the session lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .filter(Credential::is_complete)
    }

    fn set(&self, credential: Credential) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential);
    }

    fn clear(&self) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Configuration for file-backed credential storage.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_bloodlink_dir()
    }
}

/// Credential store persisted to a TOML file so a session survives restarts.
///
/// Writes go to a sibling temp file which is then renamed over the session
/// file, so readers see either the old pair or the new one.
///
/// # Example
/// ```no_run
/// use bloodlink::auth::{Credential, CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// store.set(Credential::new("access", "refresh"));
/// assert!(store.get().is_some());
/// store.clear();
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

const SESSION_FILE: &str = "session.toml";

impl FileCredentialStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            path: config.base_dir.join(SESSION_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(StoreConfig::new(default_bloodlink_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(Some(Credential::new(file.access_token, file.refresh_token)))
    }

    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            version: 1,
            saved_at: Utc::now(),
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
        };
        let serialized = toml::to_string(&file)?;
        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&staging, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err.to_string())),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        match self.load() {
            Ok(credential) => credential.filter(Credential::is_complete),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Unreadable session file");
                None
            }
        }
    }

    fn set(&self, credential: Credential) {
        if let Err(err) = self.save(&credential) {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to persist session");
        }
    }

    fn clear(&self) {
        if let Err(err) = self.remove() {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to remove session file");
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    version: u32,
    saved_at: DateTime<Utc>,
    access_token: String,
    refresh_token: String,
}

fn default_bloodlink_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".bloodlink"))
        .unwrap_or_else(|| PathBuf::from(".bloodlink"))
}
