//! The seam between the collection store and the wire

use async_trait::async_trait;

use crate::error::Error;
use crate::model::EntityId;
use crate::model::Record;

/// A source of truth for collections of records.
///
/// [`GridClient`](crate::GridClient) implements this over REST. The store only
/// talks to this trait, so tests and alternative transports can stand in.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches every record at `path` (which may carry a query string).
    async fn list(&self, path: &str) -> Result<Vec<Record>, Error>;

    /// Fetches one record by id.
    async fn get(&self, path: &str, id: &EntityId) -> Result<Record, Error>;

    /// Creates a record and returns what the backend stored.
    async fn create(&self, path: &str, record: &Record) -> Result<Record, Error>;

    /// Replaces the record addressed by its `id` attribute.
    async fn update(&self, path: &str, record: &Record) -> Result<Record, Error>;

    /// Deletes a record by id.
    async fn delete(&self, path: &str, id: &EntityId) -> Result<(), Error>;
}
