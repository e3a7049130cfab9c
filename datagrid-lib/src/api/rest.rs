//! REST operations over a collection path

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::Backend;
use crate::GridClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::EntityId;
use crate::model::Record;

fn record_path(path: &str, id: &EntityId) -> String {
    let (base, query) = match path.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (path, None),
    };
    let encoded = urlencoding::encode(&id.to_string()).into_owned();
    match query {
        Some(query) => format!("{}/{}?{}", base.trim_end_matches('/'), encoded, query),
        None => format!("{}/{}", base.trim_end_matches('/'), encoded),
    }
}

fn into_record(value: Value) -> Result<Record, Error> {
    let body = value.to_string();
    Record::from_json(value).ok_or_else(|| ApiError::parse_with_body("Expected a JSON object", body).into())
}

impl GridClient {
    /// `GET {path}`: fetches the whole collection.
    ///
    /// An empty or `204` response is an empty collection.
    pub async fn get_all(&self, path: &str) -> Result<Vec<Record>, Error> {
        let Some(body) = self.send(Method::GET, path, None).await? else {
            return Ok(Vec::new());
        };

        match body {
            Value::Array(items) => items.into_iter().map(into_record).collect(),
            other => Err(ApiError::parse_with_body("Expected a JSON array", other.to_string()).into()),
        }
    }

    /// `GET {path}/{id}`: fetches one record.
    pub async fn get_one(&self, path: &str, id: &EntityId) -> Result<Record, Error> {
        match self.send(Method::GET, &record_path(path, id), None).await? {
            Some(body) => into_record(body),
            None => Err(ApiError::parse("Empty response body").into()),
        }
    }

    /// `POST {path}`: creates a record.
    ///
    /// A `204` response returns the submitted record.
    pub async fn create_one(&self, path: &str, record: &Record) -> Result<Record, Error> {
        let payload = record.clone().into_json();
        match self.send(Method::POST, path, Some(&payload)).await? {
            Some(body) => into_record(body),
            None => Ok(record.clone()),
        }
    }

    /// `PUT {path}/{id}`: replaces the record addressed by its `id` attribute.
    ///
    /// A `204` response returns the submitted record.
    pub async fn update_one(&self, path: &str, record: &Record) -> Result<Record, Error> {
        let id = record
            .id()
            .ok_or_else(|| Error::InvalidOperation("Cannot update a record without an id".to_string()))?;

        let payload = record.clone().into_json();
        match self.send(Method::PUT, &record_path(path, &id), Some(&payload)).await? {
            Some(body) => into_record(body),
            None => Ok(record.clone()),
        }
    }

    /// `DELETE {path}/{id}`.
    pub async fn delete_one(&self, path: &str, id: &EntityId) -> Result<(), Error> {
        self.send(Method::DELETE, &record_path(path, id), None).await?;
        Ok(())
    }

    /// Sends an arbitrary JSON request with the same headers and error handling.
    ///
    /// Returns `None` when the response has no body.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let stats = client.api(Method::GET, "/users/stats", None).await?;
    /// client.api(Method::POST, "/users/7/reset", Some(&json!({"notify": true}))).await?;
    /// ```
    pub async fn api(&self, method: Method, path: &str, payload: Option<&Value>) -> Result<Option<Value>, Error> {
        self.send(method, path, payload).await
    }
}

#[async_trait]
impl Backend for GridClient {
    async fn list(&self, path: &str) -> Result<Vec<Record>, Error> {
        self.get_all(path).await
    }

    async fn get(&self, path: &str, id: &EntityId) -> Result<Record, Error> {
        self.get_one(path, id).await
    }

    async fn create(&self, path: &str, record: &Record) -> Result<Record, Error> {
        self.create_one(path, record).await
    }

    async fn update(&self, path: &str, record: &Record) -> Result<Record, Error> {
        self.update_one(path, record).await
    }

    async fn delete(&self, path: &str, id: &EntityId) -> Result<(), Error> {
        self.delete_one(path, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_encodes_id() {
        assert_eq!(record_path("/users", &EntityId::from(7)), "/users/7");
        assert_eq!(record_path("/users/", &EntityId::from("a/b c")), "/users/a%2Fb%20c");
    }

    #[test]
    fn test_record_path_keeps_query() {
        assert_eq!(record_path("/users?org=1", &EntityId::from(7)), "/users/7?org=1");
    }

    #[test]
    fn test_non_object_is_parse_error() {
        let err = into_record(Value::from(3)).unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Parse { .. })));
    }
}
