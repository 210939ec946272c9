/// Unified error types for the Tabiroku server
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the server
#[derive(Error, Debug)]
pub enum TabiError {
    /// Validation errors (bad form fields, disallowed extensions, empty batches)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown region keys, missing data files
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unparsable JSON store
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// Unknown users, blocked bots, unknown routes.
    /// Deliberately 410 rather than 404 as an anti-scraping measure.
    #[error("Gone: {0}")]
    Gone(String),

    /// Missing or invalid upload session token
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Decode/encode failures in the background compressor.
    /// Never surfaces over HTTP; logged and the file is skipped.
    #[error("Media processing error: {0}")]
    MediaProcessing(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert TabiError to HTTP response
impl IntoResponse for TabiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TabiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            TabiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            TabiError::Gone(_) => (StatusCode::GONE, self.to_string()),
            TabiError::Session(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            TabiError::MalformedData(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            TabiError::Io(_) | TabiError::Internal(_) | TabiError::MediaProcessing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse { error: message });

        (status, body).into_response()
    }
}

/// Result type alias for server operations
pub type TabiResult<T> = Result<T, TabiError>;
