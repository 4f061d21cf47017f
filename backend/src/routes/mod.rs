//! Route-specific business logic.
//!
//! Each handler takes the shared repository plus its already extracted route
//! parameters and answers with a [`HandlerResult`]. Validation failures are
//! part of that value; store failures travel as `Err(RepositoryError)` so the
//! HTTP boundary can turn them into an opaque 500.

pub mod items;
pub mod user;

/// Status and plain text body of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    /// HTTP status code
    pub status: u16,
    pub message: String,
}

/// What a handler produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult<T> {
    /// Payload serialized as the JSON response body
    Success(T),
    /// Written verbatim with its status code
    Error(ErrorValue),
}

impl<T> HandlerResult<T> {
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        HandlerResult::Error(ErrorValue {
            status,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HandlerResult::Success(_))
    }

    /// Success payload, if any.
    pub fn success(self) -> Option<T> {
        match self {
            HandlerResult::Success(value) => Some(value),
            HandlerResult::Error(_) => None,
        }
    }

    /// Rejection, if any.
    pub fn rejection(&self) -> Option<&ErrorValue> {
        match self {
            HandlerResult::Success(_) => None,
            HandlerResult::Error(err) => Some(err),
        }
    }
}

pub const ITEMS: &str = "items";
pub const USER: &str = "user";
pub const USER_SUGGEST: &str = "user-suggest";
