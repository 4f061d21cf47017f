//! HTTP handlers for the REST API.
//!
//! Each handler extracts its route parameters and delegates to the
//! matching function in [`crate::routes`]; [`Dispatch`] turns the result
//! into the response.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use prometheus::{Encoder, TextEncoder};

use super::dto::{
    first_param, HealthResponse, ItemsResponse, QueryPairs, UserResponse, UserSuggestResponse,
};
use super::error::AppError;
use super::outcome::Dispatch;
use super::state::AppState;
use crate::routes;

// =============================================================================
// Metadata
// =============================================================================

/// GET /items?ids=1,2,3
///
/// Reposts, sizes and previews for a list of items.
pub async fn get_items(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Dispatch<ItemsResponse> {
    let ids = first_param(&params, "ids");
    routes::items::fetch_items(Arc::clone(&state.repository), ids)
        .await
        .into()
}

/// GET /user/{user}
///
/// Score history of the last seven days.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Dispatch<UserResponse> {
    routes::user::fetch_user(state.repository.as_ref(), &user)
        .await
        .into()
}

/// GET /user/suggest/{prefix}
///
/// Username completion.
pub async fn get_user_suggest(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Dispatch<UserSuggestResponse> {
    routes::user::suggest_users(state.repository.as_ref(), &prefix)
        .await
        .into()
}

// =============================================================================
// Operations
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database,
    })
}

/// GET /metrics
///
/// Prometheus text exposition of the request timers.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(CONTENT_TYPE, TextEncoder::new().format_type().to_string())], body))
}
