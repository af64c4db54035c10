pub mod health;
pub mod pairs;

use axum::routing::{delete, get, post};
use axum::Router;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::services::AppState;

/// Maximum concurrent requests (backpressure control)
const MAX_CONCURRENT_REQUESTS: usize = 100;

pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/pairs", get(pairs::list_pairs))
        .route("/pairs/daily", get(pairs::daily_pair))
        .route("/pairs/random", post(pairs::random_pair))
        .route("/pairs/{id}", delete(pairs::delete_pair))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
}
