//! # REST Handlers
//!
//! Request/response types and handler functions for the REST API.
//!
//! Handlers translate between wire DTOs and application services, and
//! map [`ApplicationError`] variants onto HTTP status codes. Callback
//! acknowledgements carry their own status mapping: replays and unknown
//! references are acknowledged, not errored, so partners do not retry
//! forever.

use crate::application::error::ApplicationError;
use crate::application::services::dispatcher::{DispatchIntake, Dispatcher};
use crate::application::services::disputes::DisputeService;
use crate::application::services::reconciler::{
    CallbackAck, CallbackAuth, Reconciler, ReportedStatus,
};
use crate::domain::entities::{DealDispute, Transaction};
use crate::domain::value_objects::{
    AgentId, AggregatorId, DisputeId, ExternalRef, MerchantId, PaymentMethod, TransactionId,
};
use crate::infrastructure::persistence::traits::TransactionRepository;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Shared state for all REST handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatch entry point.
    pub dispatcher: Arc<Dispatcher>,
    /// Callback reconciler.
    pub reconciler: Arc<Reconciler>,
    /// Dispute lifecycle service.
    pub disputes: Arc<DisputeService>,
    /// Read access to dispatch attempts.
    pub transactions: Arc<dyn TransactionRepository>,
}

/// Error payload returned with non-2xx statuses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Wrapper mapping application errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            ApplicationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApplicationError::NoCapacity => (StatusCode::CONFLICT, "no_capacity"),
            ApplicationError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ApplicationError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            ApplicationError::InvalidState(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_state"),
            ApplicationError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            ApplicationError::Domain(_) => (StatusCode::UNPROCESSABLE_ENTITY, "domain_error"),
            ApplicationError::Repository(_) | ApplicationError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Request body for `POST /api/v1/transactions`.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Originating merchant.
    pub merchant_id: String,
    /// Settlement method, e.g. `CARD_TO_CARD`.
    pub method: String,
    /// Requested amount.
    pub amount: Decimal,
}

/// Wire representation of a dispatch attempt.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub id: String,
    /// Owning request id.
    pub request_id: String,
    /// 1-based attempt ordinal.
    pub attempt: u32,
    /// Requested amount.
    pub amount: Decimal,
    /// Settlement method.
    pub method: String,
    /// Assigned provider, if any.
    pub provider: Option<String>,
    /// Reference partners echo back in callbacks.
    pub external_ref: String,
    /// Current status.
    pub status: String,
    /// Settled amount, once confirmed.
    pub settled_amount: Option<Decimal>,
    /// True if the settled amount differed from the requested one.
    pub amount_discrepancy: bool,
}

impl From<&Transaction> for TransactionResponse {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id().to_string(),
            request_id: txn.request_id().to_string(),
            attempt: txn.attempt(),
            amount: txn.amount().get(),
            method: txn.method().to_string(),
            provider: txn.provider().map(ToString::to_string),
            external_ref: txn.external_ref().to_string(),
            status: txn.status().to_string(),
            settled_amount: txn.settled_amount().map(|a| a.get()),
            amount_discrepancy: txn.amount_discrepancy(),
        }
    }
}

/// Body for aggregator callbacks.
#[derive(Debug, Deserialize)]
pub struct AggregatorCallbackRequest {
    /// Reference minted at dispatch time.
    pub external_ref: String,
    /// Reported status: `PENDING`, `READY` or `FAILED`.
    pub status: String,
    /// Settled amount, when reported.
    pub amount: Option<Decimal>,
}

/// Body for trader callbacks.
#[derive(Debug, Deserialize)]
pub struct TraderCallbackRequest {
    /// Confirming trader agent.
    pub agent_id: String,
    /// Reference minted at dispatch time.
    pub external_ref: String,
    /// Reported status: `PENDING`, `READY` or `FAILED`.
    pub status: String,
    /// Settled amount, when reported.
    pub amount: Option<Decimal>,
}

/// Acknowledgement payload for callbacks.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Ack kind: `APPLIED`, `ALREADY_APPLIED`, `UNKNOWN` or `UNAUTHORIZED`.
    pub result: String,
    /// Discrepancy flag, present when the callback was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<bool>,
}

/// Request body for `POST /api/v1/disputes`.
#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
    /// Merchant raising the dispute.
    pub merchant_id: String,
    /// Contested transaction.
    pub transaction_id: String,
    /// Grounds for the dispute.
    pub reason: String,
}

/// Wire representation of a dispute.
#[derive(Debug, Serialize, Deserialize)]
pub struct DisputeResponse {
    /// Dispute id.
    pub id: String,
    /// Contested transaction id.
    pub transaction_id: String,
    /// Merchant that raised it.
    pub merchant_id: String,
    /// Accountable trader agent.
    pub agent_id: String,
    /// Current status.
    pub status: String,
    /// Merchant-supplied grounds.
    pub reason: String,
}

impl From<&DealDispute> for DisputeResponse {
    fn from(dispute: &DealDispute) -> Self {
        Self {
            id: dispute.id().to_string(),
            transaction_id: dispute.transaction_id().to_string(),
            merchant_id: dispute.merchant_id().to_string(),
            agent_id: dispute.agent_id().to_string(),
            status: dispute.status().to_string(),
            reason: dispute.reason().to_string(),
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves traffic.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// `POST /api/v1/transactions` — dispatch a collection request.
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let method = PaymentMethod::from_str(&body.method)
        .map_err(|e| ApplicationError::invalid_request(e.to_string()))?;
    let transaction = state
        .dispatcher
        .dispatch(DispatchIntake {
            merchant_id: MerchantId::new(body.merchant_id),
            method,
            amount: body.amount,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(&transaction))))
}

/// `GET /api/v1/transactions/{id}` — fetch a dispatch attempt.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let id = TransactionId::parse(&id)
        .ok_or_else(|| ApplicationError::not_found("Transaction", id.clone()))?;
    let transaction = state
        .transactions
        .get(&id)
        .await
        .map_err(ApplicationError::from)?
        .ok_or_else(|| ApplicationError::not_found("Transaction", id.to_string()))?;
    Ok(Json(TransactionResponse::from(&transaction)))
}

/// `POST /api/v1/callbacks/aggregator/{aggregator_id}` — partner callback.
pub async fn aggregator_callback(
    State(state): State<AppState>,
    Path(aggregator_id): Path<String>,
    authorization: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    Json(body): Json<AggregatorCallbackRequest>,
) -> Result<(StatusCode, Json<CallbackResponse>), ApiError> {
    // A missing or malformed header gets the same ack shape as a bad
    // token, so partners see one unauthorized contract.
    let Ok(TypedHeader(authorization)) = authorization else {
        return Ok(ack_response(CallbackAck::Unauthorized));
    };
    let reported = ReportedStatus::from_str(&body.status)
        .map_err(|e| ApplicationError::invalid_request(e.to_string()))?;
    let auth = CallbackAuth::Aggregator {
        aggregator_id: AggregatorId::new(aggregator_id),
        token: authorization.token().to_string(),
    };
    let ack = state
        .reconciler
        .apply_callback(
            &auth,
            &ExternalRef::new(body.external_ref),
            reported,
            body.amount,
        )
        .await?;
    Ok(ack_response(ack))
}

/// `POST /api/v1/callbacks/trader` — trader agent callback.
pub async fn trader_callback(
    State(state): State<AppState>,
    Json(body): Json<TraderCallbackRequest>,
) -> Result<(StatusCode, Json<CallbackResponse>), ApiError> {
    let reported = ReportedStatus::from_str(&body.status)
        .map_err(|e| ApplicationError::invalid_request(e.to_string()))?;
    let auth = CallbackAuth::Agent(AgentId::new(body.agent_id));
    let ack = state
        .reconciler
        .apply_callback(
            &auth,
            &ExternalRef::new(body.external_ref),
            reported,
            body.amount,
        )
        .await?;
    Ok(ack_response(ack))
}

fn ack_response(ack: CallbackAck) -> (StatusCode, Json<CallbackResponse>) {
    let (status, result, discrepancy) = match ack {
        CallbackAck::Applied { discrepancy } => (StatusCode::OK, "APPLIED", Some(discrepancy)),
        CallbackAck::AlreadyApplied => (StatusCode::OK, "ALREADY_APPLIED", None),
        CallbackAck::UnknownTransaction => (StatusCode::NOT_FOUND, "UNKNOWN", None),
        CallbackAck::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None),
    };
    (
        status,
        Json(CallbackResponse {
            result: result.to_string(),
            discrepancy,
        }),
    )
}

/// `POST /api/v1/disputes` — open a dispute over a settled collection.
pub async fn open_dispute(
    State(state): State<AppState>,
    Json(body): Json<OpenDisputeRequest>,
) -> Result<(StatusCode, Json<DisputeResponse>), ApiError> {
    let transaction_id = TransactionId::parse(&body.transaction_id).ok_or_else(|| {
        ApplicationError::not_found("Transaction", body.transaction_id.clone())
    })?;
    let dispute = state
        .disputes
        .open_dispute(
            &MerchantId::new(body.merchant_id),
            &transaction_id,
            body.reason,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DisputeResponse::from(&dispute))))
}

/// `GET /api/v1/disputes/{id}` — fetch a dispute.
pub async fn get_dispute(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DisputeResponse>, ApiError> {
    let id = DisputeId::parse(&id)
        .ok_or_else(|| ApplicationError::not_found("DealDispute", id.clone()))?;
    let dispute = state.disputes.get_dispute(&id).await?;
    Ok(Json(DisputeResponse::from(&dispute)))
}

/// `GET /api/v1/health` — liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
