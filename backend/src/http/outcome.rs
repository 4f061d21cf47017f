//! Conversion of handler results into HTTP responses.
//!
//! Handlers return [`Dispatch`] wrapping what the route logic produced:
//!
//! - `Ok(HandlerResult::Success(value))`: `value` as a JSON body with
//!   `Content-Type: application/json` and an exact `Content-Length`
//! - `Ok(HandlerResult::Error(..))`: the status code with the message as raw
//!   body and no content type
//! - `Err(..)`: handed to [`AppError`], which answers with an opaque 500
//!
//! The payload is encoded completely before anything is written, so a
//! serialization failure still produces a clean 500.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::error::AppError;
use crate::db::repository::RepositoryResult;
use crate::routes::{ErrorValue, HandlerResult};

/// Response adapter for a handler's result.
#[derive(Debug)]
pub struct Dispatch<T>(pub RepositoryResult<HandlerResult<T>>);

impl<T> From<RepositoryResult<HandlerResult<T>>> for Dispatch<T> {
    fn from(result: RepositoryResult<HandlerResult<T>>) -> Self {
        Dispatch(result)
    }
}

impl<T: Serialize> IntoResponse for Dispatch<T> {
    fn into_response(self) -> Response {
        let response = match self.0 {
            Ok(HandlerResult::Success(value)) => json_response(&value),
            Ok(HandlerResult::Error(rejection)) => rejection_response(rejection),
            Err(e) => Err(AppError::from(e)),
        };
        response.unwrap_or_else(IntoResponse::into_response)
    }
}

fn json_response<T: Serialize>(value: &T) -> Result<Response, AppError> {
    let body = serde_json::to_vec(value)?;
    let length = body.len();

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    Ok(response)
}

fn rejection_response(rejection: ErrorValue) -> Result<Response, AppError> {
    let status = StatusCode::from_u16(rejection.status)
        .map_err(|_| AppError::InvalidStatus(rejection.status))?;

    let mut response = Response::new(Body::from(rejection.message));
    *response.status_mut() = status;
    Ok(response)
}
