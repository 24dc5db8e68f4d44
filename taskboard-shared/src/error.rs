/// Backend error type
///
/// Every failed call to the hosted backend, whether the table store or the
/// identity service, surfaces as a `RemoteError` carrying the backend's own
/// message. Callers receive it unchanged: there is no translation and no retry.
///
/// # Error Bodies
///
/// The backend speaks two dialects:
///
/// ```text
/// PostgREST: {"code": "23505", "message": "duplicate key value ...", "details": null, "hint": null}
/// GoTrue:    {"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"}
/// GoTrue v1: {"error": "invalid_grant", "error_description": "Invalid login credentials"}
/// ```
///
/// `RemoteError::from_response` understands all three and falls back to the
/// raw body text.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Result type alias for backend calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error reported by the hosted backend or the transport reaching it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Backend-provided message
    pub message: String,

    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,

    /// Backend error code (e.g. "23505", "invalid_credentials")
    pub code: Option<String>,
}

impl RemoteError {
    /// Creates an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
        }
    }

    /// Attaches an HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a backend error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Builds an error from a non-success response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<JsonValue>(body).ok();

        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("Backend returned status {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        Self {
            message,
            status: Some(status),
            code: parsed.as_ref().and_then(extract_code),
        }
    }

    /// Whether the backend answered 401/403
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

fn extract_message(body: &JsonValue) -> Option<String> {
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(JsonValue::as_str))
        .map(str::to_string)
}

fn extract_code(body: &JsonValue) -> Option<String> {
    // GoTrue puts the HTTP status in `code`, so the string form wins
    ["error_code", "code", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(JsonValue::as_str))
        .map(str::to_string)
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            code: None,
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::new(format!("Malformed backend response: {}", err))
    }
}
