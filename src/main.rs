//! Service binary: configuration, tracing, HTTP serving and the SLA
//! sweep loop.

use anyhow::Context;
use pay_dispatch::api::rest::{create_router, AppState};
use pay_dispatch::application::services::{
    run_sweeper, AggregatorsFirstPolicy, Dispatcher, DispatcherConfig, DisputeService,
    LimitTracker, ProviderRegistry, Reconciler, RequisitesFirstPolicy, RoutingPolicy, SlaMonitor,
};
use pay_dispatch::config::Settings;
use pay_dispatch::infrastructure::persistence::in_memory::{
    InMemoryAggregatorRepository, InMemoryDisputeRepository, InMemoryDispatchRequestRepository,
    InMemoryRequisiteRepository, InMemoryTransactionRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    tracing::info!(
        bind = %settings.bind_addr(),
        max_attempts = settings.dispatch.max_attempts,
        routing_policy = %settings.dispatch.routing_policy,
        "starting pay-dispatch"
    );

    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let requests = Arc::new(InMemoryDispatchRequestRepository::new());
    let requisites = Arc::new(InMemoryRequisiteRepository::new());
    let aggregators = Arc::new(InMemoryAggregatorRepository::new());
    let disputes = Arc::new(InMemoryDisputeRepository::new());
    let limits = Arc::new(LimitTracker::new());
    let sla = Arc::new(SlaMonitor::new());

    let policy: Arc<dyn RoutingPolicy> = match settings.dispatch.routing_policy.as_str() {
        "aggregators_first" => Arc::new(AggregatorsFirstPolicy::new()),
        "requisites_first" => Arc::new(RequisitesFirstPolicy::new()),
        other => anyhow::bail!("unknown routing policy: {other}"),
    };

    let dispatcher = Arc::new(Dispatcher::new(
        ProviderRegistry::new(requisites.clone(), aggregators.clone()),
        limits.clone(),
        transactions.clone(),
        requests.clone(),
        sla.clone(),
        policy,
        DispatcherConfig {
            max_attempts: settings.dispatch.max_attempts,
        },
    ));
    let reconciler = Arc::new(Reconciler::new(
        transactions.clone(),
        requests,
        requisites.clone(),
        aggregators,
        limits,
        sla.clone(),
    ));
    let dispute_service = Arc::new(DisputeService::new(
        transactions.clone(),
        requisites,
        disputes,
    ));

    let sweeper = tokio::spawn(run_sweeper(
        sla,
        dispatcher.clone(),
        Duration::from_millis(settings.sla.sweep_interval_ms),
    ));

    let state = AppState {
        dispatcher,
        reconciler,
        disputes: dispute_service,
        transactions,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr()))?;
    axum::serve(listener, router)
        .await
        .context("server terminated")?;

    sweeper.abort();
    Ok(())
}
