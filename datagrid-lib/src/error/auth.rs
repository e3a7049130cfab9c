//! Authentication error types

/// Errors raised while resolving the bearer credential for a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider has no signed-in session.
    #[error("No credential available")]
    NoCredential,

    /// Access token expired and could not be renewed.
    #[error("Token expired and refresh failed: {message}")]
    TokenExpired { message: String },

    /// The identity provider failed for another reason.
    #[error("Identity provider error: {0}")]
    Provider(String),
}
