//! # REST Routes
//!
//! Router assembly for the REST API.

use crate::api::rest::handlers::{
    aggregator_callback, create_transaction, get_dispute, get_transaction, health, open_dispute,
    trader_callback, AppState,
};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the application router over the shared state.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions/{id}", get(get_transaction))
        .route(
            "/api/v1/callbacks/aggregator/{aggregator_id}",
            post(aggregator_callback),
        )
        .route("/api/v1/callbacks/trader", post(trader_callback))
        .route("/api/v1/disputes", post(open_dispute))
        .route("/api/v1/disputes/{id}", get(get_dispute))
        .route("/api/v1/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
