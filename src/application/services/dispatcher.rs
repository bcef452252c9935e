//! # Dispatcher
//!
//! Routes incoming collection requests onto a provider and drives SLA
//! escalation when an aggregator fails to confirm in time.
//!
//! ## Routing
//!
//! The configured [`RoutingPolicy`] sequences the provider classes; the
//! registry yields deterministic candidates within each class. Requisite
//! candidates must pass the limit tracker's window admission; aggregator
//! candidates are taken as-is and armed with their confirmation SLA.
//!
//! ## Escalation
//!
//! An expired hand-off spawns a fresh attempt under the same request,
//! with the timed-out aggregator excluded. Attempts are bounded by
//! `max_attempts`; when the budget or the provider pool runs out the
//! request fails with no capacity. Racing writers (expiry sweep versus
//! confirmation callback) are serialized by optimistic locking: whoever
//! loses the compare-and-swap backs off without effect.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::limits::{LimitTracker, Reservation};
use crate::application::services::registry::ProviderRegistry;
use crate::application::services::routing_policy::{ProviderClass, RoutingPolicy};
use crate::application::services::sla_monitor::SlaMonitor;
use crate::domain::entities::{DispatchRequest, Transaction};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    Amount, MerchantId, PaymentMethod, ProviderRef, TransactionId, TransactionStatus,
};
use crate::infrastructure::persistence::traits::{
    DispatchRequestRepository, TransactionRepository,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Bounded retries for optimistic-lock races on the request record.
const CAS_RETRIES: usize = 3;

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Maximum attempts per request, including the first.
    pub max_attempts: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// An incoming collection request from a merchant.
#[derive(Debug, Clone)]
pub struct DispatchIntake {
    /// Originating merchant.
    pub merchant_id: MerchantId,
    /// Requested settlement rail.
    pub method: PaymentMethod,
    /// Requested amount; validated on intake.
    pub amount: Decimal,
}

/// What an assignment attempt placed, before persistence.
#[derive(Debug)]
enum Placed {
    /// A requisite was claimed; the reservation backs out on rollback.
    Requisite(Reservation),
    /// An aggregator hand-off; the deadline arms after persistence.
    Aggregator { deadline: Timestamp },
}

/// Routes collection requests onto providers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: ProviderRegistry,
    limits: Arc<LimitTracker>,
    transactions: Arc<dyn TransactionRepository>,
    requests: Arc<dyn DispatchRequestRepository>,
    sla: Arc<SlaMonitor>,
    policy: Arc<dyn RoutingPolicy>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        limits: Arc<LimitTracker>,
        transactions: Arc<dyn TransactionRepository>,
        requests: Arc<dyn DispatchRequestRepository>,
        sla: Arc<SlaMonitor>,
        policy: Arc<dyn RoutingPolicy>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            limits,
            transactions,
            requests,
            sla,
            policy,
            config,
        }
    }

    /// Accepts a collection request, routes it and persists the first
    /// attempt.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::InvalidRequest` if the amount is not positive.
    /// - `ApplicationError::NoCapacity` if no provider admits the request;
    ///   the request is still recorded, marked failed.
    pub async fn dispatch(&self, intake: DispatchIntake) -> ApplicationResult<Transaction> {
        let amount = Amount::new(intake.amount)
            .map_err(|e| ApplicationError::invalid_request(e.to_string()))?;
        let now = Timestamp::now();

        let mut request = DispatchRequest::new(intake.merchant_id.clone(), intake.method, amount);
        let attempt = request.begin_attempt(self.config.max_attempts)?;
        let mut transaction = Transaction::new(
            *request.id(),
            intake.merchant_id,
            attempt,
            amount,
            intake.method,
        );

        match self.try_assign(&request, &mut transaction, now).await? {
            Some(placed) => {
                self.requests.insert(&request).await?;
                if let Err(error) = self.transactions.insert(&transaction).await {
                    self.back_out(&placed);
                    self.abandon_request(request, now).await;
                    return Err(error.into());
                }
                self.arm_if_aggregator(&transaction, &placed);
                tracing::info!(
                    request_id = %request.id(),
                    transaction_id = %transaction.id(),
                    provider = %transaction.provider().map(ToString::to_string).unwrap_or_default(),
                    "dispatched collection request"
                );
                Ok(transaction)
            }
            None => {
                request.fail("no provider capacity", now)?;
                self.requests.insert(&request).await?;
                tracing::warn!(
                    request_id = %request.id(),
                    method = %request.method(),
                    "no provider capacity for request"
                );
                Err(ApplicationError::NoCapacity)
            }
        }
    }

    /// Expires a timed-out aggregator hand-off and escalates the request.
    ///
    /// Safe to call speculatively: unknown transactions, attempts no
    /// longer pending on an aggregator, and lost races against a
    /// confirmation callback are all no-ops.
    ///
    /// # Errors
    ///
    /// Returns repository errors and persistent lock contention.
    pub async fn handle_sla_expiry(
        &self,
        transaction_id: &TransactionId,
    ) -> ApplicationResult<()> {
        let Some(transaction) = self.transactions.get(transaction_id).await? else {
            return Ok(());
        };
        if transaction.status() != TransactionStatus::PendingAggregator {
            return Ok(());
        }

        let now = Timestamp::now();
        let mut expired = transaction;
        expired.expire(now)?;
        expired.bump_version();
        match self.transactions.update(&expired).await {
            Ok(()) => {}
            // A callback settled or failed the attempt first.
            Err(error) if error.is_version_conflict() => return Ok(()),
            Err(error) => return Err(error.into()),
        }
        tracing::info!(
            transaction_id = %expired.id(),
            request_id = %expired.request_id(),
            attempt = expired.attempt(),
            "aggregator hand-off expired, escalating"
        );

        self.escalate(&expired, now).await
    }

    async fn escalate(&self, expired: &Transaction, now: Timestamp) -> ApplicationResult<()> {
        let timed_out = expired
            .provider()
            .and_then(ProviderRef::aggregator_id)
            .cloned();

        for _ in 0..CAS_RETRIES {
            let Some(mut request) = self.requests.get(expired.request_id()).await? else {
                return Err(ApplicationError::not_found(
                    "DispatchRequest",
                    expired.request_id().to_string(),
                ));
            };
            if request.outcome().is_terminal() {
                return Ok(());
            }
            if let Some(aggregator_id) = &timed_out {
                request.exclude_aggregator(aggregator_id.clone());
            }

            if request.begin_attempt(self.config.max_attempts).is_err() {
                request.fail("attempt budget exhausted", now)?;
                request.bump_version();
                match self.requests.update(&request).await {
                    Ok(()) => {
                        tracing::warn!(
                            request_id = %request.id(),
                            "attempt budget exhausted, request failed"
                        );
                        return Ok(());
                    }
                    Err(error) if error.is_version_conflict() => continue,
                    Err(error) => return Err(error.into()),
                }
            }

            let mut transaction = Transaction::new(
                *request.id(),
                request.merchant_id().clone(),
                request.attempts(),
                request.amount(),
                request.method(),
            );

            match self.try_assign(&request, &mut transaction, now).await? {
                Some(placed) => {
                    request.bump_version();
                    match self.requests.update(&request).await {
                        Ok(()) => {}
                        Err(error) if error.is_version_conflict() => {
                            self.back_out(&placed);
                            continue;
                        }
                        Err(error) => {
                            self.back_out(&placed);
                            return Err(error.into());
                        }
                    }
                    if let Err(error) = self.transactions.insert(&transaction).await {
                        self.back_out(&placed);
                        self.abandon_request(request, now).await;
                        return Err(error.into());
                    }
                    self.arm_if_aggregator(&transaction, &placed);
                    tracing::info!(
                        request_id = %request.id(),
                        transaction_id = %transaction.id(),
                        attempt = transaction.attempt(),
                        "escalated to new attempt"
                    );
                    return Ok(());
                }
                None => {
                    request.fail("no provider capacity", now)?;
                    request.bump_version();
                    match self.requests.update(&request).await {
                        Ok(()) => {
                            tracing::warn!(
                                request_id = %request.id(),
                                "escalation found no provider capacity"
                            );
                            return Ok(());
                        }
                        Err(error) if error.is_version_conflict() => continue,
                        Err(error) => return Err(error.into()),
                    }
                }
            }
        }

        Err(ApplicationError::internal(
            "persistent contention on dispatch request update",
        ))
    }

    /// Tries to place the transaction on a provider, walking the policy's
    /// class order. Mutates the transaction only; nothing is persisted.
    async fn try_assign(
        &self,
        request: &DispatchRequest,
        transaction: &mut Transaction,
        now: Timestamp,
    ) -> ApplicationResult<Option<Placed>> {
        for class in self.policy.order() {
            match class {
                ProviderClass::Requisites => {
                    let candidates = self
                        .registry
                        .eligible_requisites(request.method(), request.amount())
                        .await?;
                    for requisite in candidates {
                        match self.limits.try_reserve(&requisite, request.amount(), now) {
                            Ok(reservation) => {
                                transaction.assign_requisite(
                                    requisite.id().clone(),
                                    reservation.id,
                                    now,
                                )?;
                                return Ok(Some(Placed::Requisite(reservation)));
                            }
                            Err(denied) => {
                                tracing::debug!(
                                    requisite_id = %requisite.id(),
                                    reason = %denied,
                                    "requisite refused reservation"
                                );
                            }
                        }
                    }
                }
                ProviderClass::Aggregators => {
                    let candidates = self
                        .registry
                        .eligible_aggregators(request.method(), request.excluded_aggregators())
                        .await?;
                    if let Some(aggregator) = candidates.first() {
                        transaction.assign_aggregator(aggregator.id().clone(), now)?;
                        return Ok(Some(Placed::Aggregator {
                            deadline: aggregator.sla_deadline(now),
                        }));
                    }
                }
            }
        }
        Ok(None)
    }

    fn arm_if_aggregator(&self, transaction: &Transaction, placed: &Placed) {
        if let Placed::Aggregator { deadline } = placed {
            self.sla.arm(*transaction.id(), *deadline);
        }
    }

    fn back_out(&self, placed: &Placed) {
        if let Placed::Requisite(reservation) = placed {
            self.limits.release(&reservation.id);
        }
    }

    /// Fails a persisted request whose attempt could not be recorded,
    /// so it is not left in-flight with no transaction to resolve it.
    /// Best effort: the caller returns the original error either way.
    async fn abandon_request(&self, mut request: DispatchRequest, now: Timestamp) {
        if request.fail("attempt could not be recorded", now).is_err() {
            return;
        }
        request.bump_version();
        if let Err(error) = self.requests.update(&request).await {
            tracing::error!(
                request_id = %request.id(),
                error = %error,
                "failed to mark abandoned request"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::services::routing_policy::RequisitesFirstPolicy;
    use crate::domain::entities::{AggregatorProvider, ProviderRequisite, RequestOutcome};
    use crate::domain::value_objects::{AgentId, AggregatorId, ExternalRef, RequestId, RequisiteId};
    use crate::infrastructure::persistence::in_memory::{
        InMemoryAggregatorRepository, InMemoryDispatchRequestRepository,
        InMemoryRequisiteRepository, InMemoryTransactionRepository,
    };
    use crate::infrastructure::persistence::traits::{RepositoryError, RepositoryResult};
    use std::collections::HashMap;

    fn amount(value: i64) -> Amount {
        Amount::new(Decimal::from(value)).unwrap()
    }

    fn requisite(id: &str, operation_limit: u32) -> ProviderRequisite {
        ProviderRequisite::builder(
            RequisiteId::new(id),
            AgentId::new("agent-1"),
            PaymentMethod::CardToCard,
        )
        .amount_bounds(amount(100), amount(100_000))
        .limits(operation_limit, amount(10_000_000), 0)
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
            "token",
            refs,
            60_000,
        )
    }

    struct Harness {
        dispatcher: Dispatcher,
        transactions: Arc<InMemoryTransactionRepository>,
        requests: Arc<InMemoryDispatchRequestRepository>,
        sla: Arc<SlaMonitor>,
    }

    fn harness(
        requisites: Vec<ProviderRequisite>,
        aggregators: Vec<AggregatorProvider>,
        max_attempts: u32,
    ) -> Harness {
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let requests = Arc::new(InMemoryDispatchRequestRepository::new());
        let sla = Arc::new(SlaMonitor::new());
        let registry = ProviderRegistry::new(
            Arc::new(InMemoryRequisiteRepository::with_requisites(requisites)),
            Arc::new(InMemoryAggregatorRepository::with_aggregators(aggregators)),
        );
        let dispatcher = Dispatcher::new(
            registry,
            Arc::new(LimitTracker::new()),
            transactions.clone(),
            requests.clone(),
            sla.clone(),
            Arc::new(RequisitesFirstPolicy::new()),
            DispatcherConfig { max_attempts },
        );
        Harness {
            dispatcher,
            transactions,
            requests,
            sla,
        }
    }

    fn intake(value: i64) -> DispatchIntake {
        DispatchIntake {
            merchant_id: MerchantId::new("merchant-1"),
            method: PaymentMethod::CardToCard,
            amount: Decimal::from(value),
        }
    }

    /// Rejects every write, remembering which request lost its attempt.
    #[derive(Debug, Default)]
    struct RejectingTransactions {
        seen: parking_lot::Mutex<Option<RequestId>>,
    }

    #[async_trait::async_trait]
    impl TransactionRepository for RejectingTransactions {
        async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()> {
            *self.seen.lock() = Some(*transaction.request_id());
            Err(RepositoryError::internal("storage unavailable"))
        }

        async fn update(&self, _transaction: &Transaction) -> RepositoryResult<()> {
            Err(RepositoryError::internal("storage unavailable"))
        }

        async fn get(&self, _id: &TransactionId) -> RepositoryResult<Option<Transaction>> {
            Ok(None)
        }

        async fn get_by_external_ref(
            &self,
            _external_ref: &ExternalRef,
        ) -> RepositoryResult<Option<Transaction>> {
            Ok(None)
        }

        async fn find_by_request(
            &self,
            _request_id: &RequestId,
        ) -> RepositoryResult<Vec<Transaction>> {
            Ok(Vec::new())
        }

        async fn find_in_flight(&self) -> RepositoryResult<Vec<Transaction>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> RepositoryResult<u64> {
            Ok(0)
        }
    }

    mod dispatch {
        use super::*;

        #[tokio::test]
        async fn routes_to_requisite_first() {
            let h = harness(vec![requisite("req-1", 10)], vec![aggregator("agg-1")], 3);

            let txn = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            assert_eq!(txn.status(), TransactionStatus::Pending);
            assert!(txn.provider().unwrap().is_requisite());
            assert!(txn.reservation_id().is_some());
            assert!(!h.sla.is_armed(txn.id()));
            assert_eq!(h.requests.count().await.unwrap(), 1);
        }

        #[tokio::test]
        async fn falls_back_to_aggregator_when_quota_full() {
            let h = harness(vec![requisite("req-1", 1)], vec![aggregator("agg-1")], 3);

            let first = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            assert!(first.provider().unwrap().is_requisite());

            let second = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            assert_eq!(second.status(), TransactionStatus::PendingAggregator);
            assert!(h.sla.is_armed(second.id()));
        }

        #[tokio::test]
        async fn rejects_non_positive_amount() {
            let h = harness(vec![requisite("req-1", 10)], vec![], 3);
            let err = h.dispatcher.dispatch(intake(0)).await.unwrap_err();
            assert!(err.is_invalid_request());
            assert_eq!(h.requests.count().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn no_capacity_records_failed_request() {
            let h = harness(vec![], vec![], 3);
            let err = h.dispatcher.dispatch(intake(5000)).await.unwrap_err();
            assert!(err.is_no_capacity());

            assert_eq!(h.requests.count().await.unwrap(), 1);
            assert_eq!(h.transactions.count().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn failed_attempt_write_fails_the_request() {
            let transactions = Arc::new(RejectingTransactions::default());
            let requests = Arc::new(InMemoryDispatchRequestRepository::new());
            let limits = Arc::new(LimitTracker::new());
            let dispatcher = Dispatcher::new(
                ProviderRegistry::new(
                    Arc::new(InMemoryRequisiteRepository::with_requisites(vec![
                        requisite("req-1", 10),
                    ])),
                    Arc::new(InMemoryAggregatorRepository::new()),
                ),
                limits.clone(),
                transactions.clone(),
                requests.clone(),
                Arc::new(SlaMonitor::new()),
                Arc::new(RequisitesFirstPolicy::new()),
                DispatcherConfig { max_attempts: 3 },
            );

            let error = dispatcher.dispatch(intake(5000)).await.unwrap_err();
            assert!(matches!(error, ApplicationError::Repository(_)));

            // The request is compensated to terminal, not stranded in flight.
            let request_id = (*transactions.seen.lock()).unwrap();
            let request = requests.get(&request_id).await.unwrap().unwrap();
            assert!(request.outcome().is_terminal());

            // The reservation rolled back with it.
            let usage = limits.usage(&requisite("req-1", 10), Timestamp::now());
            assert_eq!(usage.count, 0);
        }
    }

    mod sla_expiry {
        use super::*;

        #[tokio::test]
        async fn expiry_escalates_to_next_aggregator() {
            let h = harness(vec![], vec![aggregator("agg-1"), aggregator("agg-2")], 3);

            let first = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            h.dispatcher.handle_sla_expiry(first.id()).await.unwrap();

            let expired = h.transactions.get(first.id()).await.unwrap().unwrap();
            assert_eq!(expired.status(), TransactionStatus::Expired);

            let attempts = h
                .transactions
                .find_by_request(first.request_id())
                .await
                .unwrap();
            assert_eq!(attempts.len(), 2);
            let next = &attempts[1];
            assert_eq!(next.status(), TransactionStatus::PendingAggregator);
            assert_ne!(
                next.provider().unwrap().aggregator_id(),
                first.provider().unwrap().aggregator_id()
            );
            assert!(h.sla.is_armed(next.id()));
        }

        #[tokio::test]
        async fn expiry_is_idempotent() {
            let h = harness(vec![], vec![aggregator("agg-1"), aggregator("agg-2")], 5);

            let first = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            h.dispatcher.handle_sla_expiry(first.id()).await.unwrap();
            h.dispatcher.handle_sla_expiry(first.id()).await.unwrap();

            let attempts = h
                .transactions
                .find_by_request(first.request_id())
                .await
                .unwrap();
            assert_eq!(attempts.len(), 2);
        }

        #[tokio::test]
        async fn exhausted_budget_fails_request() {
            let h = harness(vec![], vec![aggregator("agg-1"), aggregator("agg-2")], 2);

            let first = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            h.dispatcher.handle_sla_expiry(first.id()).await.unwrap();

            let attempts = h
                .transactions
                .find_by_request(first.request_id())
                .await
                .unwrap();
            h.dispatcher
                .handle_sla_expiry(attempts[1].id())
                .await
                .unwrap();

            let request = h.requests.get(first.request_id()).await.unwrap().unwrap();
            assert!(matches!(request.outcome(), RequestOutcome::Failed { .. }));

            let last = h.transactions.get(attempts[1].id()).await.unwrap().unwrap();
            assert_eq!(last.status(), TransactionStatus::Expired);
        }

        #[tokio::test]
        async fn timed_out_aggregator_is_not_retried() {
            let h = harness(vec![], vec![aggregator("agg-1")], 5);

            let first = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            h.dispatcher.handle_sla_expiry(first.id()).await.unwrap();

            // Only aggregator is excluded; the request fails.
            let request = h.requests.get(first.request_id()).await.unwrap().unwrap();
            assert!(matches!(request.outcome(), RequestOutcome::Failed { .. }));
        }

        #[tokio::test]
        async fn unknown_transaction_is_noop() {
            let h = harness(vec![], vec![aggregator("agg-1")], 3);
            h.dispatcher
                .handle_sla_expiry(&TransactionId::new_v4())
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn requisite_attempt_never_expires() {
            let h = harness(vec![requisite("req-1", 10)], vec![], 3);

            let txn = h.dispatcher.dispatch(intake(5000)).await.unwrap();
            h.dispatcher.handle_sla_expiry(txn.id()).await.unwrap();

            let stored = h.transactions.get(txn.id()).await.unwrap().unwrap();
            assert_eq!(stored.status(), TransactionStatus::Pending);
        }
    }
}
