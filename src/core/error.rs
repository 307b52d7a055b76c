use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Centralized error type for the application.
///
/// Every fallible operation in the crate returns [`AppResult`]. Infrastructure
/// errors convert automatically through `#[from]`; domain failures are built
/// explicitly with the matching variant.
///
/// # Example
///
/// ```no_run
/// use techinterview::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// A required setting is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is identified but lacks rights for the operation
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Caller is not identified on a route that requires it
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The write collides with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed request shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller cancelled the operation before it finished
    #[error("Operation cancelled")]
    Cancelled,

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP status code errors
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Currency feed could not be deserialized
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error produced once and handed to several waiters of a coalesced
    /// cache population
    #[error("{0}")]
    Shared(Arc<AppError>),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<Arc<AppError>> for AppError {
    fn from(err: Arc<AppError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(AppError::Shared)
    }
}

impl AppError {
    /// Returns the innermost error, looking through [`AppError::Shared`].
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), AppError::Configuration(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), AppError::Cancelled)
    }

    /// HTTP status the API answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Http(_) | AppError::HttpStatus(_) | AppError::Xml(_) | AppError::Telegram(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            match status {
                StatusCode::BAD_GATEWAY => "Upstream service error".to_string(),
                StatusCode::SERVICE_UNAVAILABLE => "Service is shutting down".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            match self.root() {
                AppError::NotFound(msg)
                | AppError::Permission(msg)
                | AppError::Unauthorized(msg)
                | AppError::Validation(msg)
                | AppError::Conflict(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_error_unwraps_when_unique() {
        let err = AppError::from(Arc::new(AppError::NotFound("Salary record not found".into())));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_shared_error_keeps_kind_for_status() {
        let shared = Arc::new(AppError::Configuration("Currencies:Url".into()));
        let _other_waiter = Arc::clone(&shared);
        let err = AppError::from(shared);

        assert!(matches!(err, AppError::Shared(_)));
        assert!(err.is_configuration());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Permission("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Cancelled.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
