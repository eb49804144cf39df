//! Error types for session-http
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for session-http
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("Token store error: {message}")]
    TokenStore { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a token refresh error
    pub fn token_refresh(message: impl Into<String>) -> Self {
        Self::TokenRefresh {
            message: message.into(),
        }
    }

    /// Create a token store error
    pub fn token_store(message: impl Into<String>) -> Self {
        Self::TokenStore {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a 401/403 response
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::HttpStatus { status, .. } if is_auth_status(*status))
    }

    /// Check if this error ended the session (refresh exhausted)
    pub fn is_session_ended(&self) -> bool {
        matches!(self, Error::TokenRefresh { .. })
    }
}

/// Check if an HTTP status code signals an authentication failure
fn is_auth_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Result type alias for session-http
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::token_refresh("reissue returned 401");
        assert_eq!(err.to_string(), "Token refresh failed: reissue returned 401");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }

    #[test_case(401, true ; "unauthorized")]
    #[test_case(403, true ; "forbidden")]
    #[test_case(400, false ; "bad request")]
    #[test_case(404, false ; "not found")]
    #[test_case(500, false ; "server error")]
    fn test_is_auth_failure(status: u16, expected: bool) {
        assert_eq!(Error::http_status(status, "").is_auth_failure(), expected);
    }

    #[test]
    fn test_is_session_ended() {
        assert!(Error::token_refresh("gone").is_session_ended());
        assert!(!Error::http_status(401, "").is_session_ended());
        assert!(!Error::auth("bad credentials").is_session_ended());
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::http_status(422, "").status(), Some(422));
        assert_eq!(Error::config("x").status(), None);
    }
}
