//! Durable credential storage.
//!
//! The store holds at most one bearer token under the fixed key
//! [`TOKEN_KEY`]. Absence of the key means the client is unauthenticated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Key the credential is stored under.
pub const TOKEN_KEY: &str = "ff_token";

/// Keyring service name
const SERVICE_NAME: &str = "finfraud";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Keychain did not keep the credential")]
    NotPersisted,

    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Reload-surviving key/value surface holding the credential.
///
/// Writes only ever come from the session store; the API client reads on
/// every request.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the credential. Removing an absent credential is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// File
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    token: String,
    stored_at: DateTime<Utc>,
}

/// Stores the credential as `<dir>/ff_token.json`.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", TOKEN_KEY))
    }

    /// When the stored credential was written, if any
    pub fn stored_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(read_record(&self.path())?.map(|r| r.stored_at))
    }
}

fn read_record(path: &Path) -> Result<Option<TokenRecord>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(read_record(&self.path())?
            .map(|r| r.token)
            .filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let record = TokenRecord {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        fs::write(self.path(), serde_json::to_string_pretty(&record)?)?;
        debug!(path = ?self.path(), "Credential written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
            debug!(?path, "Credential removed");
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Stores the credential in the OS keychain.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Store under a different keychain service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, TOKEN_KEY)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(token) if token.is_empty() => Ok(None),
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        self.entry()?.set_password(token)?;
        // Backends without persistence accept the write and read back nothing
        if self.load()?.as_deref() != Some(token) {
            return Err(StoreError::NotPersisted);
        }
        debug!(service = %self.service, "Credential saved to keychain");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store. Nothing survives a restart; used for tests and
/// throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let guard = self.token.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        let mut guard = self.token.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.token.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}
