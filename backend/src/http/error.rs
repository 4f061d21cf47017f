//! HTTP error handling.
//!
//! `AppError` is the single boundary for failures that are not part of a
//! handler's answer: store errors, payloads that fail to serialize and
//! panics. They are all logged with their cause and answered with the same
//! opaque 500.

use std::any::Any;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::db::repository::RepositoryError;

/// Body of every internal failure response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Application error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Store query or connection failure
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// Success payload could not be encoded
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Handler answered with a status code HTTP does not know
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
    /// Metrics exposition failed
    #[error("failed to render metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    /// A handler panicked
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");

        let mut response = Response::new(Body::from(INTERNAL_ERROR_MESSAGE));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

/// Response for a panic caught by the outer recovery layer.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Panic(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_repository_error_is_opaque() {
        let err = AppError::from(RepositoryError::query("relation \"tags\" does not exist"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_panic_response_is_opaque() {
        let response = panic_response(Box::new("boom"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, INTERNAL_ERROR_MESSAGE);
    }
}
