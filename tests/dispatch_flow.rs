//! End-to-end dispatch scenarios exercised through the REST router.
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pay_dispatch::api::rest::{create_router, AppState};
use pay_dispatch::application::services::{
    Dispatcher, DispatcherConfig, DisputeService, LimitTracker, ProviderRegistry, Reconciler,
    RequisitesFirstPolicy, SlaMonitor,
};
use pay_dispatch::domain::entities::{AggregatorProvider, ProviderRequisite};
use pay_dispatch::domain::value_objects::{
    AgentId, AggregatorId, Amount, PaymentMethod, RequisiteId,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "partner-secret";

struct TestApp {
    router: Router,
    dispatcher: Arc<Dispatcher>,
}

fn amount(value: i64) -> Amount {
    Amount::new(Decimal::from(value)).unwrap()
}

fn requisite(id: &str, agent: &str, operation_limit: u32, sum_limit: i64) -> ProviderRequisite {
    ProviderRequisite::builder(
        RequisiteId::new(id),
        AgentId::new(agent),
        PaymentMethod::CardToCard,
    )
    .recipient("Card holder", "**** 1111")
    .amount_bounds(amount(100), amount(100_000))
    .limits(operation_limit, amount(sum_limit), 0)
    .build()
    .unwrap()
}

fn aggregator(id: &str) -> AggregatorProvider {
    let mut refs = HashMap::new();
    refs.insert(PaymentMethod::CardToCard, "c2c".to_string());
    AggregatorProvider::new(
        AggregatorId::new(id),
        id,
        "https://partner.example",
        TOKEN,
        refs,
        60_000,
    )
}

fn test_app(requisites: Vec<ProviderRequisite>, aggregators: Vec<AggregatorProvider>) -> TestApp {
    use pay_dispatch::infrastructure::persistence::in_memory::{
        InMemoryAggregatorRepository, InMemoryDisputeRepository,
        InMemoryDispatchRequestRepository, InMemoryRequisiteRepository,
        InMemoryTransactionRepository,
    };

    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let requests = Arc::new(InMemoryDispatchRequestRepository::new());
    let requisite_repo = Arc::new(InMemoryRequisiteRepository::with_requisites(requisites));
    let aggregator_repo = Arc::new(InMemoryAggregatorRepository::with_aggregators(aggregators));
    let limits = Arc::new(LimitTracker::new());
    let sla = Arc::new(SlaMonitor::new());

    let dispatcher = Arc::new(Dispatcher::new(
        ProviderRegistry::new(requisite_repo.clone(), aggregator_repo.clone()),
        limits.clone(),
        transactions.clone(),
        requests.clone(),
        sla.clone(),
        Arc::new(RequisitesFirstPolicy::new()),
        DispatcherConfig { max_attempts: 3 },
    ));
    let reconciler = Arc::new(Reconciler::new(
        transactions.clone(),
        requests,
        requisite_repo.clone(),
        aggregator_repo,
        limits,
        sla,
    ));
    let disputes = Arc::new(DisputeService::new(
        transactions.clone(),
        requisite_repo,
        Arc::new(InMemoryDisputeRepository::new()),
    ));

    let router = create_router(AppState {
        dispatcher: dispatcher.clone(),
        reconciler,
        disputes,
        transactions,
    });
    TestApp { router, dispatcher }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_with_bearer(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn dispatch(app: &TestApp, value: i64) -> (StatusCode, Value) {
    send(
        &app.router,
        post(
            "/api/v1/transactions",
            &json!({
                "merchant_id": "merchant-1",
                "method": "CARD_TO_CARD",
                "amount": value.to_string(),
            }),
        ),
    )
    .await
}

#[tokio::test]
async fn requisite_flow_settles_via_trader_callback() {
    let app = test_app(vec![requisite("req-1", "agent-1", 10, 1_000_000)], vec![]);

    let (status, txn) = dispatch(&app, 5000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(txn["status"], "PENDING");
    assert!(txn["provider"].as_str().unwrap().starts_with("REQUISITE"));

    let (status, ack) = send(
        &app.router,
        post(
            "/api/v1/callbacks/trader",
            &json!({
                "agent_id": "agent-1",
                "external_ref": txn["external_ref"],
                "status": "READY",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "APPLIED");
    assert_eq!(ack["discrepancy"], false);

    let uri = format!("/api/v1/transactions/{}", txn["id"].as_str().unwrap());
    let (status, stored) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["status"], "READY");
    assert_eq!(stored["settled_amount"], "5000");
}

#[tokio::test]
async fn eleventh_dispatch_overflows_to_aggregator() {
    let app = test_app(
        vec![requisite("req-1", "agent-1", 10, 10_000_000)],
        vec![aggregator("agg-1")],
    );

    for _ in 0..10 {
        let (status, txn) = dispatch(&app, 1000).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(txn["provider"].as_str().unwrap().starts_with("REQUISITE"));
    }

    let (status, txn) = dispatch(&app, 1000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(txn["provider"].as_str().unwrap().starts_with("AGGREGATOR"));
    assert_eq!(txn["status"], "PENDING_AGGREGATOR");
}

#[tokio::test]
async fn sum_limit_overflows_before_count_limit() {
    let app = test_app(
        vec![requisite("req-1", "agent-1", 100, 9_000)],
        vec![aggregator("agg-1")],
    );

    let (_, first) = dispatch(&app, 5000).await;
    assert!(first["provider"].as_str().unwrap().starts_with("REQUISITE"));

    // 5000 + 5000 > 9000, so the second goes to the partner.
    let (_, second) = dispatch(&app, 5000).await;
    assert!(second["provider"].as_str().unwrap().starts_with("AGGREGATOR"));
}

#[tokio::test]
async fn no_capacity_returns_conflict() {
    let app = test_app(vec![], vec![]);
    let (status, body) = dispatch(&app, 5000).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_capacity");
}

#[tokio::test]
async fn invalid_amount_returns_bad_request() {
    let app = test_app(vec![requisite("req-1", "agent-1", 10, 1_000_000)], vec![]);
    let (status, body) = dispatch(&app, -1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn aggregator_callback_requires_valid_token() {
    let app = test_app(vec![], vec![aggregator("agg-1")]);
    let (_, txn) = dispatch(&app, 5000).await;

    let body = json!({
        "external_ref": txn["external_ref"],
        "status": "READY",
    });

    let (status, ack) = send(
        &app.router,
        post_with_bearer("/api/v1/callbacks/aggregator/agg-1", "wrong-token", &body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ack["result"], "UNAUTHORIZED");

    // No header at all gets the same ack shape, not a generic 400.
    let (status, ack) = send(
        &app.router,
        post("/api/v1/callbacks/aggregator/agg-1", &body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ack["result"], "UNAUTHORIZED");

    let (status, ack) = send(
        &app.router,
        post_with_bearer("/api/v1/callbacks/aggregator/agg-1", TOKEN, &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "APPLIED");
}

#[tokio::test]
async fn duplicate_callback_is_acknowledged_once() {
    let app = test_app(vec![], vec![aggregator("agg-1")]);
    let (_, txn) = dispatch(&app, 5000).await;

    let body = json!({
        "external_ref": txn["external_ref"],
        "status": "READY",
        "amount": "5000",
    });
    let uri = "/api/v1/callbacks/aggregator/agg-1";

    let (status, ack) = send(&app.router, post_with_bearer(uri, TOKEN, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "APPLIED");

    let (status, ack) = send(&app.router, post_with_bearer(uri, TOKEN, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "ALREADY_APPLIED");
}

#[tokio::test]
async fn unknown_reference_returns_not_found_ack() {
    let app = test_app(vec![], vec![aggregator("agg-1")]);

    let (status, ack) = send(
        &app.router,
        post_with_bearer(
            "/api/v1/callbacks/aggregator/agg-1",
            TOKEN,
            &json!({ "external_ref": "no-such-ref", "status": "READY" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(ack["result"], "UNKNOWN");
}

#[tokio::test]
async fn discrepant_settlement_is_flagged() {
    let app = test_app(vec![requisite("req-1", "agent-1", 10, 1_000_000)], vec![]);
    let (_, txn) = dispatch(&app, 5000).await;

    let (status, ack) = send(
        &app.router,
        post(
            "/api/v1/callbacks/trader",
            &json!({
                "agent_id": "agent-1",
                "external_ref": txn["external_ref"],
                "status": "READY",
                "amount": "4990",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "APPLIED");
    assert_eq!(ack["discrepancy"], true);
}

#[tokio::test]
async fn sla_expiry_escalates_and_late_callback_is_inert() {
    let app = test_app(vec![], vec![aggregator("agg-1"), aggregator("agg-2")]);
    let (_, txn) = dispatch(&app, 5000).await;
    let txn_id = txn["id"].as_str().unwrap();

    // Drive the expiry directly instead of waiting out the deadline.
    let id = pay_dispatch::domain::value_objects::TransactionId::parse(txn_id).unwrap();
    app.dispatcher.handle_sla_expiry(&id).await.unwrap();

    let (_, stored) = send(&app.router, get(&format!("/api/v1/transactions/{txn_id}"))).await;
    assert_eq!(stored["status"], "EXPIRED");

    // The partner's late confirmation no longer applies.
    let (status, ack) = send(
        &app.router,
        post_with_bearer(
            "/api/v1/callbacks/aggregator/agg-1",
            TOKEN,
            &json!({ "external_ref": txn["external_ref"], "status": "READY" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"], "ALREADY_APPLIED");
}

#[tokio::test]
async fn dispute_lifecycle_over_http() {
    let app = test_app(vec![requisite("req-1", "agent-1", 10, 1_000_000)], vec![]);
    let (_, txn) = dispatch(&app, 5000).await;
    let txn_id = txn["id"].as_str().unwrap().to_string();

    // Not settled yet: the dispute is refused.
    let dispute_body = json!({
        "merchant_id": "merchant-1",
        "transaction_id": txn_id,
        "reason": "payer reports funds missing",
    });
    let (status, body) = send(&app.router, post("/api/v1/disputes", &dispute_body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_state");

    send(
        &app.router,
        post(
            "/api/v1/callbacks/trader",
            &json!({
                "agent_id": "agent-1",
                "external_ref": txn["external_ref"],
                "status": "READY",
            }),
        ),
    )
    .await;

    let (status, dispute) = send(&app.router, post("/api/v1/disputes", &dispute_body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dispute["status"], "OPEN");
    assert_eq!(dispute["agent_id"], "agent-1");

    let (status, body) = send(&app.router, post("/api/v1/disputes", &dispute_body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    let uri = format!("/api/v1/disputes/{}", dispute["id"].as_str().unwrap());
    let (status, fetched) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["transaction_id"], txn["id"]);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = test_app(vec![], vec![]);
    let (status, body) = send(&app.router, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
