use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message shown to the user for any failure they can only retry.
pub const RETRY_MESSAGE: &str =
    "Could not connect to translation service. Please check your internet connection and try again.";

/// Failures of a single translation request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Text to translate is empty")]
    EmptyInput,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Translation request timed out")]
    Timeout,

    #[error("Translation request was cancelled")]
    Cancelled,

    #[error("API error: {0}")]
    Api(String),

    #[error("Unexpected API response format")]
    MalformedResponse,
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::Timeout
        } else {
            TranslationError::Connection(err.to_string())
        }
    }
}

/// Failures of the history store and its blob persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stored history is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to persist history: {0}")]
    Persistence(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

/// Error returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Translation(TranslationError::EmptyInput) => {
                (StatusCode::BAD_REQUEST, "empty_input", self.to_string())
            }
            ApiError::Translation(TranslationError::Connection(_)) => {
                (StatusCode::BAD_GATEWAY, "connection_error", RETRY_MESSAGE.to_string())
            }
            ApiError::Translation(TranslationError::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout", RETRY_MESSAGE.to_string())
            }
            ApiError::Translation(TranslationError::Cancelled) => {
                (StatusCode::CONFLICT, "cancelled", self.to_string())
            }
            ApiError::Translation(TranslationError::Api(message)) => {
                (StatusCode::BAD_GATEWAY, "api_error", message.clone())
            }
            ApiError::Translation(TranslationError::MalformedResponse) => {
                (StatusCode::BAD_GATEWAY, "malformed_response", self.to_string())
            }
            ApiError::Store(StoreError::Corrupt(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_store", self.to_string())
            }
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_error",
                "Could not update translation history. Please try again.".to_string(),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "bad_request", message.clone())
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_provider_message() {
        let err = ApiError::from(TranslationError::Api("Invalid Value".to_string()));
        let (status, kind, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(kind, "api_error");
        assert_eq!(message, "Invalid Value");
    }

    #[test]
    fn test_connection_error_uses_retry_message() {
        let err = ApiError::from(TranslationError::Connection("refused".to_string()));
        let (_, kind, message) = err.parts();
        assert_eq!(kind, "connection_error");
        assert_eq!(message, RETRY_MESSAGE);
    }

    #[test]
    fn test_corrupt_store_is_not_reported_as_persistence() {
        let (status, kind, _) = ApiError::from(StoreError::Corrupt("bad bytes".to_string())).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "corrupt_store");
    }

    #[test]
    fn test_empty_input_is_bad_request() {
        let (status, _, _) = ApiError::from(TranslationError::EmptyInput).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
