//! TokenProvider trait and AccessToken

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::error::AuthError;

/// A bearer token handed out by the identity provider.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token used for API authentication.
    pub access_token: String,
    /// When the token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a new access token with just the token string.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Creates a new access token with expiration time.
    pub fn with_expiry(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Returns `true` if the token has expired.
    ///
    /// Returns `false` if expiration time is unknown.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Returns the token as a bearer authorization header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Source of the bearer credential attached to every request.
///
/// The client calls `get_token` before each request, so implementations
/// are free to cache, refresh or re-authenticate behind it.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use datagrid_lib::auth::{AccessToken, TokenProvider};
/// use datagrid_lib::error::AuthError;
///
/// struct SessionTokens {
///     session: MySession,
/// }
///
/// #[async_trait]
/// impl TokenProvider for SessionTokens {
///     async fn get_token(&self) -> Result<AccessToken, AuthError> {
///         let id_token = self.session.id_token().await.ok_or(AuthError::NoCredential)?;
///         Ok(AccessToken::new(id_token))
///     }
/// }
/// ```
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Gets the credential for the next request.
    async fn get_token(&self) -> Result<AccessToken, AuthError>;
}

/// A token provider that always returns the same token.
///
/// Useful for testing or when the caller manages token lifetime itself.
///
/// # Example
///
/// ```
/// use datagrid_lib::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("my-access-token");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a new static token provider with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }

    /// Creates a new static token provider from an existing AccessToken.
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        if self.token.is_expired() {
            return Err(AuthError::TokenExpired {
                message: "static token cannot be refreshed".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("abc");
        let token = provider.get_token().await.unwrap();
        assert_eq!(token.as_bearer(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_expired_static_token_is_rejected() {
        let past = Utc::now() - chrono::Duration::minutes(1);
        let provider = StaticTokenProvider::from_token(AccessToken::with_expiry("abc", past));
        assert!(matches!(
            provider.get_token().await,
            Err(AuthError::TokenExpired { .. })
        ));
    }
}
