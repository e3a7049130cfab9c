//! API error types

use std::time::Duration;

use serde_json::Value;

/// Errors that can occur while talking to the REST backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Error response (status >= 400) from the backend.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Human-readable message extracted from the response body.
        message: String,
        /// Application error code, if the body carried one.
        code: Option<String>,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a successful response body.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

/// Reads a non-empty string field from a JSON error body.
fn text_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Reads the `code` field, accepting strings and numbers.
fn code_field(body: &Value) -> Option<String> {
    match body.get("code")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ApiError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Builds an HTTP error from a fully read error response body.
    ///
    /// An empty body yields `HTTP {status}: {reason}`. A body that is not JSON,
    /// or JSON without a string `message`/`error` field, is surfaced verbatim.
    pub fn from_body(status: u16, reason: &str, body: &str) -> Self {
        if body.is_empty() {
            return Self::http(status, format!("HTTP {}: {}", status, reason));
        }

        let Ok(parsed) = serde_json::from_str::<Value>(body) else {
            return Self::http(status, body);
        };

        let message = text_field(&parsed, "message")
            .or_else(|| text_field(&parsed, "error"))
            .map_or_else(|| body.to_string(), str::to_string);

        Self::Http {
            status,
            message,
            code: code_field(&parsed),
        }
    }

    /// Creates a new parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the application error code if available.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for 404 responses.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
