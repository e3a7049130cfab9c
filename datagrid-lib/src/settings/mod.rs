//! Settings system for typed key-value storage.
//!
//! Holds the small amount of state that outlives a session: the chosen page
//! size of a grid and the tenant override sent with every request.

mod backend;
mod memory;
mod sqlite;

pub use backend::SettingsBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "datagrid";
const APPLICATION: &str = "datagrid";

/// Prefix applied to every key written through a [`PersistentValue`].
pub const PERSISTENT_PREFIX: &str = "use_persistent_storage_";

/// Settings error type.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
    #[error("deserialization error: {0}")]
    Deserialization(serde_json::Error),
}

/// Default location of the settings database.
///
/// - Linux: `$XDG_DATA_HOME/datagrid/settings.db`
/// - macOS: `~/Library/Application Support/dev.datagrid.datagrid/settings.db`
/// - Windows: `C:\Users\<User>\AppData\Roaming\datagrid\datagrid\data\settings.db`
pub fn default_db_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.data_dir().join("settings.db"))
}

/// Typed settings provider.
///
/// Wraps a `SettingsBackend` with typed serialization via JSON.
#[derive(Clone)]
pub struct SettingsProvider {
    backend: Arc<dyn SettingsBackend>,
}

impl SettingsProvider {
    /// Create a new settings provider with the given backend.
    pub fn new(backend: impl SettingsBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a provider over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Get a typed value for a key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        match self.backend.read(key).await? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).map_err(SettingsError::Deserialization)?,
            )),
            None => Ok(None),
        }
    }

    /// Get a value stored as a bare string, without JSON decoding.
    ///
    /// Values written by other tools (e.g. the tenant override) are plain text.
    pub async fn get_text(&self, key: &str) -> Result<Option<String>, SettingsError> {
        self.backend.read(key).await
    }

    /// Store a bare string, without JSON encoding.
    pub async fn set_text(&self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        self.backend.write(key, value.into()).await
    }

    /// Set a typed value for a key.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(value).map_err(SettingsError::Serialization)?;
        self.backend.write(key, raw).await
    }
}

impl std::fmt::Debug for SettingsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsProvider").finish_non_exhaustive()
    }
}

/// A value that survives across sessions under a stable key.
///
/// Reads fall back to the initial value when nothing was stored yet or the
/// stored value no longer decodes. Writes reach storage before memory.
#[derive(Debug, Clone)]
pub struct PersistentValue<T> {
    key: String,
    value: T,
    settings: SettingsProvider,
}

impl<T> PersistentValue<T>
where
    T: Serialize + DeserializeOwned + Clone + Sync,
{
    /// Loads the value stored under `key`, or `initial` if none.
    pub async fn load(settings: SettingsProvider, key: &str, initial: T) -> Self {
        let key = format!("{}{}", PERSISTENT_PREFIX, key);
        let value = match settings.get::<T>(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => initial,
            Err(e) => {
                log::warn!("Ignoring unreadable setting {}: {}", key, e);
                initial
            }
        };
        Self { key, value, settings }
    }

    /// Returns the current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Writes the value to storage, then replaces the held value.
    ///
    /// On a failed write the held value is unchanged.
    pub async fn set(&mut self, value: T) -> Result<(), SettingsError> {
        self.settings.set(&self.key, &value).await?;
        self.value = value;
        Ok(())
    }

    /// Returns the full storage key.
    pub fn key(&self) -> &str {
        &self.key
    }
}
