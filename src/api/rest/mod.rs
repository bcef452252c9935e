//! # REST API
//!
//! REST endpoints using axum.
//!
//! # Endpoints
//!
//! ## Transactions
//! - `POST /api/v1/transactions` - Dispatch a collection request
//! - `GET /api/v1/transactions/{id}` - Get a dispatch attempt
//!
//! ## Callbacks
//! - `POST /api/v1/callbacks/aggregator/{aggregator_id}` - Partner
//!   confirmation (bearer token auth)
//! - `POST /api/v1/callbacks/trader` - Trader agent confirmation
//!
//! ## Disputes
//! - `POST /api/v1/disputes` - Open a dispute over a settled collection
//! - `GET /api/v1/disputes/{id}` - Get a dispute
//!
//! ## Health
//! - `GET /api/v1/health` - Health check endpoint
//!
//! # Usage
//!
//! ```ignore
//! use pay_dispatch::api::rest::{create_router, AppState};
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    AggregatorCallbackRequest, ApiError, AppState, CallbackResponse, CreateTransactionRequest,
    DisputeResponse, ErrorResponse, HealthResponse, OpenDisputeRequest, TraderCallbackRequest,
    TransactionResponse,
};
pub use routes::create_router;
