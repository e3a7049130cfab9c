//! SQLite settings backend.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite::OptionalExtension;
use async_sqlite::rusqlite::params;
use async_trait::async_trait;
use dashmap::DashMap;

use super::SettingsBackend;
use super::SettingsError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS grid_settings (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

const SELECT: &str = "SELECT value FROM grid_settings WHERE name = ?1";

const UPSERT: &str = "INSERT INTO grid_settings (name, value) VALUES (?1, ?2)
    ON CONFLICT(name) DO UPDATE SET value = excluded.value";

/// Settings stored in a SQLite file.
///
/// Values read or written once are kept in memory, so repeated reads of the
/// same key (the page size of every grid that opens) stay off the database.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::settings::SqliteBackend;
///
/// let backend = SqliteBackend::open("settings.db").await?;
/// ```
pub struct SqliteBackend {
    client: Client,
    memo: DashMap<String, String>,
}

impl SqliteBackend {
    /// Opens (or creates) the settings database at `path` in WAL mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let builder = ClientBuilder::new().path(path).journal_mode(JournalMode::Wal);
        Self::connect(builder).await
    }

    async fn connect(builder: ClientBuilder) -> Result<Self, SettingsError> {
        let client = builder.open().await?;
        client.conn(|conn| conn.execute(SCHEMA, [])).await?;

        Ok(Self {
            client,
            memo: DashMap::new(),
        })
    }
}

#[async_trait]
impl SettingsBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        if let Some(hit) = self.memo.get(key) {
            return Ok(Some(hit.value().clone()));
        }

        let name = key.to_string();
        let stored = self
            .client
            .conn(move |conn| {
                conn.query_row(SELECT, [&name], |row| row.get::<_, String>(0))
                    .optional()
            })
            .await?;

        if let Some(value) = &stored {
            self.memo.insert(key.to_string(), value.clone());
        }
        Ok(stored)
    }

    async fn write(&self, key: &str, value: String) -> Result<(), SettingsError> {
        let name = key.to_string();
        let text = value.clone();
        self.client
            .conn(move |conn| conn.execute(UPSERT, params![name, text]))
            .await?;

        self.memo.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory() -> SqliteBackend {
        SqliteBackend::connect(ClientBuilder::new().path(":memory:"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let backend = in_memory().await;
        assert_eq!(backend.read("page-size").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let backend = in_memory().await;
        backend.write("page-size", "10".into()).await.unwrap();
        backend.write("page-size", "20".into()).await.unwrap();
        assert_eq!(backend.read("page-size").await.unwrap().as_deref(), Some("20"));
    }

    #[tokio::test]
    async fn test_reads_rows_not_yet_memoised() {
        let backend = in_memory().await;
        backend
            .client
            .conn(|conn| conn.execute(UPSERT, params!["tenant", "acme"]))
            .await
            .unwrap();
        assert_eq!(backend.read("tenant").await.unwrap().as_deref(), Some("acme"));
    }
}
