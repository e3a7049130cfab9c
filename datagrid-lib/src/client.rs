//! Main GridClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde_json::Value;

use crate::auth::TokenProvider;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::error::Error;
use crate::settings::SettingsProvider;

/// Header carrying the tenant override.
pub const DEFAULT_TENANT_HEADER: &str = "X-Assume-Org";

/// Settings key the tenant override is read from.
pub const DEFAULT_TENANT_KEY: &str = "a360.assumed-org";

/// The client for the REST backend behind a grid.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely. Every request resolves a bearer token from the
/// token provider at call time and, when a settings provider is configured,
/// adds the tenant override header from persisted settings.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::{GridClient, auth::StaticTokenProvider};
///
/// let provider = StaticTokenProvider::new("my-token");
/// let client = GridClient::builder()
///     .url("https://api.example.com")
///     .token_provider(provider)
///     .build()?;
///
/// let users = client.get_all("/users").await?;
/// ```
#[derive(Clone)]
pub struct GridClient {
    inner: Arc<GridClientInner>,
}

struct GridClientInner {
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
    http_client: Client,
    timeout: Option<Duration>,
    settings: Option<SettingsProvider>,
    tenant_header: HeaderName,
    tenant_key: String,
}

impl GridClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> GridClientBuilder<Missing, Missing> {
        GridClientBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the settings provider used for the tenant override.
    pub fn settings(&self) -> Option<&SettingsProvider> {
        self.inner.settings.as_ref()
    }

    /// Joins the base URL and a request path.
    pub(crate) fn url_for(&self, path: &str) -> String {
        let base = self.inner.base_url.trim_end_matches('/');
        if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn headers(&self) -> Result<HeaderMap, Error> {
        let token = self.inner.token_provider.get_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&token.as_bearer())
            .map_err(|_| AuthError::Provider("Token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        if let Some(tenant) = self.tenant().await {
            match HeaderValue::from_str(&tenant) {
                Ok(value) => {
                    headers.insert(self.inner.tenant_header.clone(), value);
                }
                Err(_) => log::warn!("Ignoring tenant override that is not a valid header value"),
            }
        }

        Ok(headers)
    }

    async fn tenant(&self) -> Option<String> {
        let settings = self.inner.settings.as_ref()?;
        match settings.get_text(&self.inner.tenant_key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                log::warn!("Failed to read tenant override {}: {}", self.inner.tenant_key, e);
                None
            }
        }
    }

    /// Sends a JSON request and returns the parsed body.
    ///
    /// Returns `None` for `204 No Content` and empty bodies. Responses with a
    /// status of 400 or above become [`ApiError::Http`] with the message taken
    /// from the body.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Option<Value>, Error> {
        let url = self.url_for(path);
        log::debug!("{} {}", method, url);

        let mut request = self
            .inner
            .http_client
            .request(method, &url)
            .headers(self.headers().await?);

        if let Some(payload) = payload {
            request = request.json(payload);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.as_u16() >= 400 {
            let reason = status.canonical_reason().unwrap_or("");
            let error = ApiError::from_body(status.as_u16(), reason, &body);
            log::debug!("{} failed: {}", url, error);
            return Err(error.into());
        }

        if status == reqwest::StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), body).into())
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.inner.timeout.unwrap_or_default())
        } else {
            ApiError::Network(error)
        }
    }
}

impl std::fmt::Debug for GridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`GridClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The backend base URL
/// - `token_provider` - A [`TokenProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = GridClient::builder()
///     .url("https://api.example.com")
///     .token_provider(my_provider)
///     .settings(settings)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct GridClientBuilder<Url, Provider> {
    url: Url,
    token_provider: Provider,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    settings: Option<SettingsProvider>,
    tenant_header: String,
    tenant_key: String,
}

impl GridClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token_provider: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
            settings: None,
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            tenant_key: DEFAULT_TENANT_KEY.to_string(),
        }
    }
}

impl Default for GridClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> GridClientBuilder<Missing, P> {
    /// Sets the backend base URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .url("https://api.example.com")
    /// ```
    pub fn url(self, url: impl Into<String>) -> GridClientBuilder<Set<String>, P> {
        GridClientBuilder {
            url: Set(url.into()),
            token_provider: self.token_provider,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            settings: self.settings,
            tenant_header: self.tenant_header,
            tenant_key: self.tenant_key,
        }
    }
}

impl<U> GridClientBuilder<U, Missing> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(
        self,
        provider: T,
    ) -> GridClientBuilder<U, Set<Arc<dyn TokenProvider>>> {
        GridClientBuilder {
            url: self.url,
            token_provider: Set(Arc::new(provider) as Arc<dyn TokenProvider>),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            settings: self.settings,
            tenant_header: self.tenant_header,
            tenant_key: self.tenant_key,
        }
    }
}

impl<U, P> GridClientBuilder<U, P> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings provider the tenant override is read from.
    pub fn settings(mut self, settings: SettingsProvider) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the tenant override header name.
    ///
    /// Defaults to `X-Assume-Org`.
    pub fn tenant_header(mut self, name: impl Into<String>) -> Self {
        self.tenant_header = name.into();
        self
    }

    /// Sets the settings key holding the tenant override.
    ///
    /// Defaults to `a360.assumed-org`.
    pub fn tenant_key(mut self, key: impl Into<String>) -> Self {
        self.tenant_key = key.into();
        self
    }
}

impl GridClientBuilder<Set<String>, Set<Arc<dyn TokenProvider>>> {
    /// Builds the [`GridClient`].
    ///
    /// This method is only available when both `url` and `token_provider` have been set.
    pub fn build(self) -> Result<GridClient, Error> {
        let base_url = self.url.0;
        url::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let tenant_header = HeaderName::from_bytes(self.tenant_header.as_bytes())
            .map_err(|_| Error::InvalidOperation(format!("Invalid header name: {}", self.tenant_header)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(ApiError::from)?
            }
        };

        Ok(GridClient {
            inner: Arc::new(GridClientInner {
                base_url,
                token_provider: self.token_provider.0,
                http_client,
                timeout: self.timeout,
                settings: self.settings,
                tenant_header,
                tenant_key: self.tenant_key,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client(url: &str) -> GridClient {
        GridClient::builder()
            .url(url)
            .token_provider(StaticTokenProvider::new("t"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_url_join() {
        let c = client("https://api.example.com/");
        assert_eq!(c.url_for("/users"), "https://api.example.com/users");
        assert_eq!(c.url_for("users/1"), "https://api.example.com/users/1");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = GridClient::builder()
            .url("not a url")
            .token_provider(StaticTokenProvider::new("t"))
            .build();
        assert!(matches!(result, Err(Error::Api(ApiError::InvalidUrl(_)))));
    }

    #[test]
    fn test_invalid_tenant_header_rejected() {
        let result = GridClient::builder()
            .url("https://api.example.com")
            .token_provider(StaticTokenProvider::new("t"))
            .tenant_header("bad header")
            .build();
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_tenant_read_from_settings() {
        let settings = SettingsProvider::in_memory();
        let c = GridClient::builder()
            .url("https://api.example.com")
            .token_provider(StaticTokenProvider::new("t"))
            .settings(settings.clone())
            .build()
            .unwrap();

        assert_eq!(c.tenant().await, None);
        settings.set_text(DEFAULT_TENANT_KEY, "acme").await.unwrap();
        assert_eq!(c.tenant().await.as_deref(), Some("acme"));

        let headers = c.headers().await.unwrap();
        assert_eq!(headers.get(DEFAULT_TENANT_HEADER).unwrap(), "acme");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer t");
    }
}
