//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, tracing, panic
//! recovery, per-route timers) and creates the axum router ready for
//! serving.

use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use super::error::panic_response;
use super::handlers;
use super::state::AppState;
use super::timing::time_route;
use crate::metrics::RequestMetrics;
use crate::routes;

/// Install `method_router` behind the timer of `route`.
fn timed(
    metrics: &RequestMetrics,
    route: &str,
    method_router: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    method_router.layer(middleware::from_fn_with_state(
        metrics.route_timer(route),
        time_route,
    ))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let metrics = state.metrics.clone();

    Router::new()
        .route(
            "/items",
            timed(&metrics, routes::ITEMS, get(handlers::get_items)),
        )
        .route(
            "/user/{user}",
            timed(&metrics, routes::USER, get(handlers::get_user)),
        )
        .route(
            "/user/suggest/{prefix}",
            timed(&metrics, routes::USER_SUGGEST, get(handlers::get_user_suggest)),
        )
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Router wrapped so that `/items/` is served like `/items`.
///
/// Path normalization has to run before routing, hence outside the router.
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}
