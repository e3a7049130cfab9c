//! In-memory settings backend.

use async_trait::async_trait;
use dashmap::DashMap;

use super::SettingsBackend;
use super::SettingsError;

/// Settings held in a concurrent map. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: DashMap<String, String>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: String) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
