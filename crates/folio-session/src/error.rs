//! Error types for the client core.

use folio_storage::StorageError;
use thiserror::Error;

/// Failure of a single API round-trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response payload did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The request payload could not be serialized
    #[error("Invalid request body: {0}")]
    Encode(String),

    /// The endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message from the server's error body, if it carries one.
    ///
    /// Understands `{ "message": "..." }` and `{ "message": ["...", "..."] }`.
    pub fn server_message(&self) -> Option<String> {
        let ApiError::Http { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        match value.get("message")? {
            serde_json::Value::String(message) => Some(message.clone()),
            serde_json::Value::Array(parts) => {
                let parts: Vec<&str> = parts.iter().filter_map(|p| p.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a session mutator.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The underlying API call failed; carried unchanged
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Credentials could not be persisted
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The operation needs stored credentials and there are none
    #[error("Not logged in")]
    NotAuthenticated,
}

impl SessionError {
    /// The transport error, if this failure came from the API.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_unauthorized() {
        let unauthorized = ApiError::Http {
            status: 401,
            body: String::new(),
        };
        assert_eq!(unauthorized.status(), Some(401));
        assert!(unauthorized.is_unauthorized());

        let network = ApiError::Network("connection refused".to_string());
        assert_eq!(network.status(), None);
        assert!(!network.is_unauthorized());
    }

    #[test]
    fn test_server_message_string_and_array() {
        let single = ApiError::Http {
            status: 400,
            body: r#"{"statusCode":400,"message":"Email already registered"}"#.to_string(),
        };
        assert_eq!(single.server_message().as_deref(), Some("Email already registered"));

        let many = ApiError::Http {
            status: 400,
            body: r#"{"message":["email must be an email","password is too short"]}"#.to_string(),
        };
        assert_eq!(
            many.server_message().as_deref(),
            Some("email must be an email; password is too short")
        );

        let plain = ApiError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(plain.server_message(), None);
    }

    #[test]
    fn test_session_error_exposes_api_error() {
        let err = SessionError::from(ApiError::Http {
            status: 409,
            body: "{}".to_string(),
        });
        assert_eq!(err.api_error().and_then(ApiError::status), Some(409));
        assert!(SessionError::NotAuthenticated.api_error().is_none());
    }
}
