//! Per-route request timing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::Histogram;

/// Middleware observing the full dispatch time of one route.
///
/// The timer records when it is dropped, so requests that unwind still count.
pub async fn time_route(State(timer): State<Histogram>, request: Request, next: Next) -> Response {
    let _timer = timer.start_timer();
    next.run(request).await
}
