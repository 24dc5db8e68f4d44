/// Error handling for the web server
///
/// This module provides a unified error type that maps to HTTP responses.
/// JSON handlers return `Result<T, ApiError>` which automatically converts
/// to the matching status code and an [`ErrorResponse`] body. HTML handlers
/// turn the same errors into flash messages instead.
///
/// Backend failures keep the backend's own message. Only their status is
/// mapped: client-side statuses pass through, anything else becomes
/// `502 Bad Gateway`.
///
/// # Example
///
/// ```
/// use taskboard_web::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<Vec<String>>> {
///     Err(ApiError::NotFound("No tasks row with id 42".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskboard_shared::{
    auth::AuthError,
    database::{validation_messages, DataError},
    RemoteError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., email already registered
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Bad gateway (502) - the backend failed
    BadGateway(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Message suitable for showing to the user
    ///
    /// Internal errors stay generic; everything else keeps its detail.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg) => msg.clone(),
            ApiError::ValidationError(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(". "),
            ApiError::InternalError(_) => "An internal error occurred".to_string(),
        }
    }

    /// HTTP status of this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::BadGateway(msg) => write!(f, "Backend error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::BadGateway(msg) => {
                tracing::warn!("Backend error: {}", msg);
                ("bad_gateway", msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert backend errors to API errors, keeping the backend message
impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        match err.status {
            Some(401) | Some(403) => ApiError::Unauthorized(err.message),
            Some(404) => ApiError::NotFound(err.message),
            Some(409) => ApiError::Conflict(err.message),
            Some(status) if (400..500).contains(&status) => ApiError::BadRequest(err.message),
            _ => ApiError::BadGateway(err.message),
        }
    }
}

/// Convert data access errors to API errors
impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Invalid { errors, .. } => ApiError::ValidationError(
                validation_messages(&errors)
                    .into_iter()
                    .map(|(field, message)| ValidationErrorDetail { field, message })
                    .collect(),
            ),
            DataError::Remote(err) => err.into(),
        }
    }
}

/// Convert identity errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Session expired, please sign in again".to_string())
            }
            AuthError::AlreadyRegistered => ApiError::Conflict(err.to_string()),
            AuthError::Remote(err) => err.into(),
            AuthError::Password(err) => {
                ApiError::InternalError(format!("Password operation failed: {}", err))
            }
        }
    }
}

/// Convert session store errors to API errors
impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::InternalError(format!("Session error: {}", err))
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(
            validation_messages(&errors)
                .into_iter()
                .map(|(field, message)| ValidationErrorDetail { field, message })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::models::Table;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_remote_status_mapping() {
        let cases = [
            (Some(401), StatusCode::UNAUTHORIZED),
            (Some(404), StatusCode::NOT_FOUND),
            (Some(409), StatusCode::CONFLICT),
            (Some(400), StatusCode::BAD_REQUEST),
            (Some(503), StatusCode::BAD_GATEWAY),
            (None, StatusCode::BAD_GATEWAY),
        ];

        for (status, expected) in cases {
            let mut remote = RemoteError::new("duplicate key value");
            remote.status = status;

            let err = ApiError::from(remote);
            assert_eq!(err.status(), expected, "status {:?}", status);
            assert_eq!(err.user_message(), "duplicate key value");
        }
    }

    #[test]
    fn test_invalid_record_becomes_validation_error() {
        #[derive(Validate)]
        struct Payload {
            #[validate(length(min = 1, message = "Task name must be 1-255 characters"))]
            task_name: String,
        }

        let errors = Payload {
            task_name: String::new(),
        }
        .validate()
        .unwrap_err();

        let err = ApiError::from(DataError::Invalid {
            table: Table::Tasks,
            errors,
        });

        match &err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "task_name");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), "Task name must be 1-255 characters");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::AlreadyRegistered).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::InternalError("connection reset".to_string());
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
