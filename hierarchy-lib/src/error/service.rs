//! Remote service error types

use std::time::Duration;

/// HTTP status the backend answers with for missing credentials.
pub const STATUS_UNAUTHORIZED: u16 = 401;
/// HTTP status the backend answers with for insufficient rights.
pub const STATUS_FORBIDDEN: u16 = 403;

/// Errors that can occur while talking to the remote tree service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Error response from the backend.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL built from the configured base and module.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to decode the backend answer.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl ServiceError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
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
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the backend refused access (401 or 403).
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.status_code(),
            Some(STATUS_UNAUTHORIZED) | Some(STATUS_FORBIDDEN)
        )
    }
}
