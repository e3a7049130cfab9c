//! Settings backend trait.

use async_trait::async_trait;

use super::SettingsError;

/// Key-value storage for settings that outlive a session.
///
/// Values are stored as text. [`SettingsProvider`](super::SettingsProvider)
/// layers JSON encoding on top.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Reads the text stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: String) -> Result<(), SettingsError>;
}
