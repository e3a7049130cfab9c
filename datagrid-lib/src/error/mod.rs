//! Error types

mod api;
mod auth;
mod validation;

pub use api::*;
pub use auth::*;
pub use validation::*;

use crate::settings::SettingsError;

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend rejected the request or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No bearer credential could be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Required fields were missing before submission.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persisted preferences could not be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Request or response payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A fetch was superseded by a mutation on the same key.
    #[error("Request cancelled")]
    Cancelled,

    /// The caller asked for something the operation cannot do.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Returns `true` for failures of the HTTP round trip itself,
    /// including failures to obtain the bearer credential.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Api(_) | Self::Auth(_))
    }

    /// Returns `true` if a client-side check failed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the HTTP status code, if the backend answered with an error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            _ => None,
        }
    }

    /// Message suitable for an inline error banner.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
