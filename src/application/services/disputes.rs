//! # Dispute Service
//!
//! Opens and closes merchant disputes over settled collections.
//!
//! A dispute is only admissible against a transaction that settled on a
//! trader requisite: aggregator settlements are contested with the
//! partner out of band. The accountable agent is resolved from the
//! requisite at opening time and frozen on the dispute, so later
//! requisite changes do not reassign blame.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::DealDispute;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{DisputeId, MerchantId, ProviderRef, TransactionId};
use crate::infrastructure::persistence::traits::{
    DisputeRepository, RequisiteRepository, TransactionRepository,
};
use std::sync::Arc;

/// Opens and resolves deal disputes.
#[derive(Debug)]
pub struct DisputeService {
    transactions: Arc<dyn TransactionRepository>,
    requisites: Arc<dyn RequisiteRepository>,
    disputes: Arc<dyn DisputeRepository>,
}

impl DisputeService {
    /// Creates a dispute service over the given repositories.
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        requisites: Arc<dyn RequisiteRepository>,
        disputes: Arc<dyn DisputeRepository>,
    ) -> Self {
        Self {
            transactions,
            requisites,
            disputes,
        }
    }

    /// Opens a dispute against a settled, requisite-routed transaction.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` if the transaction does not exist.
    /// - `ApplicationError::Unauthorized` if the merchant does not own it.
    /// - `ApplicationError::InvalidState` if the transaction is not
    ///   settled or was routed to an aggregator.
    /// - `ApplicationError::AlreadyExists` if a dispute is already open
    ///   or closed for the transaction.
    pub async fn open_dispute(
        &self,
        merchant_id: &MerchantId,
        transaction_id: &TransactionId,
        reason: impl Into<String> + Send,
    ) -> ApplicationResult<DealDispute> {
        let Some(transaction) = self.transactions.get(transaction_id).await? else {
            return Err(ApplicationError::not_found(
                "Transaction",
                transaction_id.to_string(),
            ));
        };
        if transaction.merchant_id() != merchant_id {
            return Err(ApplicationError::Unauthorized);
        }
        if !transaction.is_settled() {
            return Err(ApplicationError::invalid_state(
                "only settled transactions can be disputed",
            ));
        }
        let Some(ProviderRef::Requisite(requisite_id)) = transaction.provider() else {
            return Err(ApplicationError::invalid_state(
                "aggregator settlements are disputed with the partner directly",
            ));
        };
        let Some(requisite) = self.requisites.get(requisite_id).await? else {
            return Err(ApplicationError::internal(format!(
                "requisite {requisite_id} assigned to settled transaction is gone"
            )));
        };

        let dispute = DealDispute::open(
            *transaction_id,
            merchant_id.clone(),
            requisite.agent_id().clone(),
            reason,
        );
        match self.disputes.insert(&dispute).await {
            Ok(()) => {
                tracing::info!(
                    dispute_id = %dispute.id(),
                    transaction_id = %transaction_id,
                    agent_id = %dispute.agent_id(),
                    "dispute opened"
                );
                Ok(dispute)
            }
            Err(error) if error.is_duplicate() => Err(ApplicationError::already_exists(
                format!("dispute already exists for transaction {transaction_id}"),
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Resolves an open dispute in the merchant's favor.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` if the dispute does not exist
    /// and a domain error if it is already closed.
    pub async fn resolve_dispute(
        &self,
        dispute_id: &DisputeId,
        note: impl Into<String> + Send,
    ) -> ApplicationResult<DealDispute> {
        self.close_dispute(dispute_id, note, true).await
    }

    /// Rejects an open dispute.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` if the dispute does not exist
    /// and a domain error if it is already closed.
    pub async fn reject_dispute(
        &self,
        dispute_id: &DisputeId,
        note: impl Into<String> + Send,
    ) -> ApplicationResult<DealDispute> {
        self.close_dispute(dispute_id, note, false).await
    }

    /// Gets a dispute by id.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` if it does not exist.
    pub async fn get_dispute(&self, dispute_id: &DisputeId) -> ApplicationResult<DealDispute> {
        self.disputes
            .get(dispute_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("DealDispute", dispute_id.to_string()))
    }

    async fn close_dispute(
        &self,
        dispute_id: &DisputeId,
        note: impl Into<String> + Send,
        in_merchant_favor: bool,
    ) -> ApplicationResult<DealDispute> {
        let mut dispute = self.get_dispute(dispute_id).await?;
        let now = Timestamp::now();
        if in_merchant_favor {
            dispute.resolve(note, now)?;
        } else {
            dispute.reject(note, now)?;
        }
        dispute.bump_version();
        self.disputes.update(&dispute).await?;
        tracing::info!(
            dispute_id = %dispute.id(),
            status = %dispute.status(),
            "dispute closed"
        );
        Ok(dispute)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::Transaction;
    use crate::domain::value_objects::{
        AgentId, Amount, DisputeStatus, PaymentMethod, RequestId, RequisiteId, ReservationId,
    };
    use crate::infrastructure::persistence::in_memory::{
        InMemoryDisputeRepository, InMemoryRequisiteRepository, InMemoryTransactionRepository,
    };
    use rust_decimal::Decimal;

    fn amount(value: i64) -> Amount {
        Amount::new(Decimal::from(value)).unwrap()
    }

    struct Harness {
        service: DisputeService,
        transactions: Arc<InMemoryTransactionRepository>,
    }

    async fn harness() -> Harness {
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let requisite = crate::domain::entities::ProviderRequisite::builder(
            RequisiteId::new("req-1"),
            AgentId::new("agent-1"),
            PaymentMethod::CardToCard,
        )
        .amount_bounds(amount(100), amount(100_000))
        .limits(10, amount(1_000_000), 0)
        .build()
        .unwrap();
        let requisites = Arc::new(InMemoryRequisiteRepository::with_requisites(vec![requisite]));
        let service = DisputeService::new(
            transactions.clone(),
            requisites,
            Arc::new(InMemoryDisputeRepository::new()),
        );
        Harness {
            service,
            transactions,
        }
    }

    async fn settled_on_requisite(h: &Harness) -> Transaction {
        let mut txn = Transaction::new(
            RequestId::new_v4(),
            MerchantId::new("merchant-1"),
            1,
            amount(5000),
            PaymentMethod::CardToCard,
        );
        txn.assign_requisite(
            RequisiteId::new("req-1"),
            ReservationId::new_v4(),
            Timestamp::now(),
        )
        .unwrap();
        txn.mark_ready(amount(5000), Timestamp::now()).unwrap();
        h.transactions.insert(&txn).await.unwrap();
        txn
    }

    async fn pending_on_aggregator(h: &Harness) -> Transaction {
        let mut txn = Transaction::new(
            RequestId::new_v4(),
            MerchantId::new("merchant-1"),
            1,
            amount(5000),
            PaymentMethod::CardToCard,
        );
        txn.assign_aggregator(
            crate::domain::value_objects::AggregatorId::new("agg-1"),
            Timestamp::now(),
        )
        .unwrap();
        h.transactions.insert(&txn).await.unwrap();
        txn
    }

    #[tokio::test]
    async fn opens_dispute_against_settled_requisite_attempt() {
        let h = harness().await;
        let txn = settled_on_requisite(&h).await;

        let dispute = h
            .service
            .open_dispute(&MerchantId::new("merchant-1"), txn.id(), "not received")
            .await
            .unwrap();
        assert_eq!(dispute.status(), DisputeStatus::Open);
        assert_eq!(dispute.agent_id().as_str(), "agent-1");
        assert_eq!(dispute.transaction_id(), txn.id());
    }

    #[tokio::test]
    async fn second_dispute_is_rejected() {
        let h = harness().await;
        let txn = settled_on_requisite(&h).await;
        let merchant = MerchantId::new("merchant-1");

        h.service
            .open_dispute(&merchant, txn.id(), "not received")
            .await
            .unwrap();
        let err = h
            .service
            .open_dispute(&merchant, txn.id(), "still not received")
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn unsettled_transaction_cannot_be_disputed() {
        let h = harness().await;
        let txn = pending_on_aggregator(&h).await;

        let err = h
            .service
            .open_dispute(&MerchantId::new("merchant-1"), txn.id(), "reason")
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn aggregator_settlement_cannot_be_disputed() {
        let h = harness().await;
        let mut txn = pending_on_aggregator(&h).await;
        txn.mark_ready(amount(5000), Timestamp::now()).unwrap();
        txn.bump_version();
        h.transactions.update(&txn).await.unwrap();

        let err = h
            .service
            .open_dispute(&MerchantId::new("merchant-1"), txn.id(), "reason")
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn foreign_merchant_cannot_dispute() {
        let h = harness().await;
        let txn = settled_on_requisite(&h).await;

        let err = h
            .service
            .open_dispute(&MerchantId::new("merchant-2"), txn.id(), "reason")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let h = harness().await;
        let err = h
            .service
            .open_dispute(
                &MerchantId::new("merchant-1"),
                &TransactionId::new_v4(),
                "reason",
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn resolve_and_reject_close_the_dispute() {
        let h = harness().await;
        let merchant = MerchantId::new("merchant-1");

        let txn = settled_on_requisite(&h).await;
        let dispute = h
            .service
            .open_dispute(&merchant, txn.id(), "not received")
            .await
            .unwrap();
        let resolved = h
            .service
            .resolve_dispute(dispute.id(), "refunded")
            .await
            .unwrap();
        assert_eq!(resolved.status(), DisputeStatus::Resolved);

        // Closing again is a domain error.
        assert!(h.service.reject_dispute(dispute.id(), "flip").await.is_err());
    }
}
