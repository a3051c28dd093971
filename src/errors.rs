use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Each variant is one machine-distinguishable failure category so that
/// webhook integrators and the dashboard can branch on status code and
/// message without scraping free text.
#[derive(Debug)]
pub enum AppError {
    /// Server-side configuration defect (e.g. webhook secret not set).
    /// Always fails the request closed; never falls back to "accept all".
    Config(String),
    /// Bad or missing credential (webhook secret or staff session).
    Unauthorized(String),
    /// Request body was empty or whitespace-only.
    EmptyBody,
    /// Request body did not parse as JSON. Carries the parser's message.
    MalformedJson(String),
    /// Request body parsed, but was not a JSON object.
    WrongShape(String),
    /// A required field was absent, mistyped, or blank.
    MissingField(&'static str),
    /// A recognized field carried an unusable value.
    InvalidField {
        /// Field name as it appears in the payload.
        field: &'static str,
        /// What was wrong with the value.
        details: String,
    },
    /// No row matched the requested identifier.
    NotFound(String),
    /// The backing store rejected or failed the operation.
    Database(sqlx::Error),
    /// Anything uncaught; converted to a generic 500 at the boundary.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Server configuration error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::EmptyBody => write!(f, "Request body is empty"),
            AppError::MalformedJson(msg) => write!(f, "Invalid JSON in request body: {}", msg),
            AppError::WrongShape(msg) => write!(f, "Invalid JSON shape: {}", msg),
            AppError::MissingField(field) => write!(f, "Missing required field: {}", field),
            AppError::InvalidField { field, details } => {
                write!(f, "Invalid field {}: {}", field, details)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each variant to its status code and a JSON `{error, details}`
    /// body. Logging severity follows the category: configuration and storage
    /// failures are loud (they indicate a deployment defect), auth failures
    /// are warnings and never include the credential value itself.
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Server configuration error: {}", msg),
                    None,
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized request: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    format!("Unauthorized: {}", msg),
                    None,
                )
            }
            AppError::EmptyBody => (
                StatusCode::BAD_REQUEST,
                "Invalid request: Request body is empty".to_string(),
                Some("Expected JSON body with at least patient_name and phone_number".to_string()),
            ),
            AppError::MalformedJson(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid JSON in request body".to_string(),
                Some(msg),
            ),
            AppError::WrongShape(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid JSON: Expected an object".to_string(),
                Some(msg),
            ),
            AppError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field: {}", field),
                Some(format!("{} must be a non-empty string", field)),
            ),
            AppError::InvalidField { field, details } => (
                StatusCode::BAD_REQUEST,
                format!("Invalid value for field: {}", field),
                Some(details),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to complete database operation".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => Json(json!({ "error": error, "details": details })),
            None => Json(json!({ "error": error })),
        };

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
